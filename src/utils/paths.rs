//! Path utilities for the launcher

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// File that marks the game's source root
pub const PROJECT_MARKER: &str = "CMakeLists.txt";

/// Find the launcher root, starting from the current directory
pub fn find_launcher_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    Ok(find_launcher_root_from(&current_dir))
}

/// Nearest ancestor of `start` holding CMakeLists.txt, or `start` itself
///
/// Nested CMake projects are common, so the outermost match is not wanted;
/// the first hit walking upwards wins.
pub fn find_launcher_root_from(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_MARKER).is_file())
        .unwrap_or(start)
        .to_path_buf()
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory tree, returning the bytes freed, or `None` if it was absent
pub fn remove_dir_if_exists(path: &Path) -> Result<Option<u64>> {
    if !path.exists() {
        return Ok(None);
    }

    let size = dir_size(path);
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    Ok(Some(size))
}

/// Total size of the regular files under `path`
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|metadata| metadata.is_file())
        .map(|metadata| metadata.len())
        .sum()
}

/// Human-readable byte count
pub fn format_size(size_bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_root_is_nearest_cmake_project() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("Source").join("Scenes");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(PROJECT_MARKER), "project(Sokobee C)\n").unwrap();

        assert_eq!(find_launcher_root_from(&nested), temp.path());
    }

    #[test]
    fn test_root_falls_back_to_start() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("empty");
        std::fs::create_dir_all(&dir).unwrap();

        // Only meaningful when no ancestor of the temp dir is a CMake project
        if !temp.path().ancestors().any(|d| d.join(PROJECT_MARKER).is_file()) {
            assert_eq!(find_launcher_root_from(&dir), dir);
        }
    }

    #[test]
    fn test_remove_dir_reports_size() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("Build");
        std::fs::create_dir_all(build.join("CMakeFiles")).unwrap();
        std::fs::write(build.join("CMakeCache.txt"), vec![b'x'; 100]).unwrap();
        std::fs::write(build.join("CMakeFiles").join("a.o"), vec![b'y'; 28]).unwrap();

        assert_eq!(remove_dir_if_exists(&build).unwrap(), Some(128));
        assert!(!build.exists());
    }

    #[test]
    fn test_remove_absent_dir_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        assert_eq!(remove_dir_if_exists(&temp.path().join("Build")).unwrap(), None);
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("Build");
        ensure_dir(&build).unwrap();
        ensure_dir(&build).unwrap();
        assert!(build.is_dir());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
