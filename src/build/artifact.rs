//! Locating the executable produced by the build

use std::path::{Path, PathBuf};

use super::Platform;

/// Expected path of the game executable inside the build directory
pub fn expected_path(build_dir: &Path, name: &str, platform: Platform) -> PathBuf {
    build_dir.join(format!("{}{}", name, platform.executable_suffix()))
}

/// The executable, if the build produced a runnable one
pub fn locate(build_dir: &Path, name: &str, platform: Platform) -> Option<PathBuf> {
    let path = expected_path(build_dir, name, platform);
    is_runnable(&path).then_some(path)
}

/// Regular file with an execute bit (any file on non-unix hosts)
pub fn is_runnable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
