//! External process execution

pub mod subprocess;

#[cfg(test)]
pub mod fake;
