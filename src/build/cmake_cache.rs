//! Reader for `CMakeCache.txt`
//!
//! CMake persists every cache variable as a `KEY:TYPE=VALUE` line. The
//! launcher only reads it, to avoid asking again for dependency directories
//! that an earlier configure already recorded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

/// File name CMake writes into the build directory
pub const CACHE_FILE_NAME: &str = "CMakeCache.txt";

/// Parsed cache entries
#[derive(Debug, Clone, Default)]
pub struct CMakeCache {
    entries: HashMap<String, String>,
}

impl CMakeCache {
    /// Path of the cache file inside a build directory
    pub fn path_in(build_dir: &Path) -> PathBuf {
        build_dir.join(CACHE_FILE_NAME)
    }

    /// Load the cache from a build directory; a missing file is an empty cache
    pub fn load(build_dir: &Path) -> Result<Self> {
        let path = Self::path_in(build_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let cache = Self::parse(&content);
        tracing::debug!(path = %path.display(), entries = cache.len(), "loaded CMake cache");
        Ok(cache)
    }

    /// Parse cache text; when a key repeats, the last assignment wins
    pub fn parse(content: &str) -> Self {
        let line_re =
            Regex::new(r"^([^:=\s]+)(?::[^=]*)?=(.*)$").expect("cache line pattern is valid");

        let mut entries = HashMap::new();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }
            if let Some(caps) = line_re.captures(line) {
                entries.insert(caps[1].to_string(), caps[2].to_string());
            }
        }

        Self { entries }
    }

    /// Value recorded for `name`, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# This is the CMakeCache file.
# For build in directory: /game/Build

//The directory containing a CMake configuration file for SDL2.
SDL2_DIR:PATH=/opt/homebrew/lib/cmake/SDL2

//Choose the type of build
CMAKE_BUILD_TYPE:STRING=Debug
SDL2_ttf_DIR:PATH=/x/ttf
SDL2_ttf_DIR:PATH=/y/ttf
UNTYPED=value=with=equals
";

    #[test]
    fn test_parse_typed_entries() {
        let cache = CMakeCache::parse(SAMPLE);
        assert_eq!(cache.get("SDL2_DIR"), Some("/opt/homebrew/lib/cmake/SDL2"));
        assert_eq!(cache.get("CMAKE_BUILD_TYPE"), Some("Debug"));
    }

    #[test]
    fn test_last_assignment_wins() {
        let cache = CMakeCache::parse(SAMPLE);
        assert_eq!(cache.get("SDL2_ttf_DIR"), Some("/y/ttf"));
    }

    #[test]
    fn test_untyped_entry_keeps_equals_in_value() {
        let cache = CMakeCache::parse(SAMPLE);
        assert_eq!(cache.get("UNTYPED"), Some("value=with=equals"));
    }

    #[test]
    fn test_key_must_match_exactly() {
        let cache = CMakeCache::parse("SDL2_DIR_EXTRA:PATH=/nope\n");
        assert_eq!(cache.get("SDL2_DIR"), None);
        assert_eq!(cache.get("SDL2_DIR_EXTRA"), Some("/nope"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let cache = CMakeCache::parse("//SDL2_DIR:PATH=/commented\n# SDL2_DIR=/also\n");
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_crlf_lines() {
        let cache = CMakeCache::parse("SDL2_DIR:PATH=C:/SDL2\r\n");
        assert_eq!(cache.get("SDL2_DIR"), Some("C:/SDL2"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let cache = CMakeCache::load(temp.path()).unwrap();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_load_from_build_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CACHE_FILE_NAME), "SDL2_DIR:PATH=/x/y\n").unwrap();
        let cache = CMakeCache::load(temp.path()).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("SDL2_DIR"), Some("/x/y"));
    }
}
