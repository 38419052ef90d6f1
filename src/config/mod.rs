//! Configuration module
//!
//! Handles parsing of the optional Launch.toml at the launcher root.

pub mod launch_toml;

pub use launch_toml::{DiagnosticsConfig, LaunchConfig};
