//! Dependency directory resolution
//!
//! The game's CMakeLists.txt needs a `<Package>_DIR` variable for each SDL
//! library. Values already in `CMakeCache.txt` are left alone; the rest come
//! from a chain of [`DependencyResolver`]s, the last of which usually asks the
//! operator.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use super::cmake_cache::CMakeCache;
use crate::error::LaunchError;

/// Looks up a value for a dependency variable
pub trait DependencyResolver {
    /// `Ok(None)` means this resolver has nothing for `name`
    fn resolve(&mut self, name: &str) -> Result<Option<String>>;
}

/// Reads a process environment variable of the same name
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvResolver;

impl DependencyResolver for EnvResolver {
    fn resolve(&mut self, name: &str) -> Result<Option<String>> {
        Ok(std::env::var(name).ok().filter(|value| !value.trim().is_empty()))
    }
}

/// Fixed values, typically the `[dependencies]` table of `Launch.toml`
#[derive(Debug, Default, Clone)]
pub struct ConfigResolver {
    values: HashMap<String, String>,
}

impl ConfigResolver {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl DependencyResolver for ConfigResolver {
    fn resolve(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.values.get(name).cloned())
    }
}

/// Asks the operator for a path, one line per variable
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> DependencyResolver for PromptResolver<R, W> {
    fn resolve(&mut self, name: &str) -> Result<Option<String>> {
        write!(self.output, "Path for {}: ", name)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .with_context(|| format!("Failed to read a path for {}", name))?;

        let value = line.trim();
        if read == 0 || value.is_empty() {
            return Ok(None);
        }
        Ok(Some(value.to_string()))
    }
}

/// Tries each resolver in turn; the first answer wins
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn DependencyResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl DependencyResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl DependencyResolver for ChainResolver {
    fn resolve(&mut self, name: &str) -> Result<Option<String>> {
        for resolver in &mut self.resolvers {
            if let Some(value) = resolver.resolve(name)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

/// Compute the `-D` overrides needed for variables missing from the cache
///
/// Variables are visited in the given order and each missing one is resolved
/// exactly once. A variable nobody can supply is an error.
pub fn dependency_overrides(
    names: &[String],
    cache: &CMakeCache,
    resolver: &mut dyn DependencyResolver,
) -> Result<Vec<(String, String)>> {
    let mut overrides = Vec::new();

    for name in names {
        if let Some(cached) = cache.get(name) {
            tracing::debug!(variable = %name, value = %cached, "using cached dependency path");
            continue;
        }

        match resolver.resolve(name)? {
            Some(value) => overrides.push((name.clone(), value)),
            None => return Err(LaunchError::unresolved_dependency(name).into()),
        }
    }

    Ok(overrides)
}
