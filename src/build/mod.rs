//! Native build orchestration for the game
//!
//! ## Architecture
//!
//! ```text
//! launch CLI → build/pipeline.rs → cmake.rs (configure, build) → artifact.rs → run / diagnostics.rs
//! ```
//!
//! ## Modules
//!
//! - `cmake` - CMake configure/build command construction and execution
//! - `cmake_cache` - Reading previously configured values out of `CMakeCache.txt`
//! - `resolve` - Pluggable lookup of dependency directory variables
//! - `artifact` - Locating the produced executable
//! - `diagnostics` - Leak-diagnostics run mode
//! - `pipeline` - The ordered, fail-fast launch pipeline

pub mod artifact;
pub mod cmake;
pub mod cmake_cache;
pub mod diagnostics;
pub mod pipeline;
pub mod resolve;

use std::fmt;
use std::str::FromStr;

use crate::error::LaunchError;

/// Name of the game's executable target, without platform suffix
pub const ARTIFACT_NAME: &str = "Sokobee";

/// Name of the build directory under the launcher root
pub const BUILD_DIR_NAME: &str = "Build";

/// Dependency directory variables the game's CMakeLists.txt expects, in prompt order
pub const DEPENDENCY_VARIABLES: &[&str] = &["SDL2_DIR", "SDL2_ttf_DIR", "SDL2_mixer_DIR"];

/// CMake build type accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    pub fn is_debug(&self) -> bool {
        matches!(self, BuildMode::Debug)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => write!(f, "Debug"),
            BuildMode::Release => write!(f, "Release"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildMode::Debug),
            "Release" => Ok(BuildMode::Release),
            _ => Err(()),
        }
    }
}

/// Host platform, as far as the launcher cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// Detect the platform this binary was compiled for
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Filename suffix of executables
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }

    /// Generator and C compiler forced on this platform, if any
    ///
    /// The default Visual Studio generator ignores `-fsanitize`, so Windows
    /// builds go through Ninja with clang.
    pub fn default_toolchain(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Platform::Windows => Some(("Ninja", "clang")),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Linux => write!(f, "linux"),
            Platform::Other => write!(f, "other"),
        }
    }
}

/// A validated launch invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchRequest {
    pub mode: BuildMode,
    pub clean: bool,
    pub leaks: bool,
}

impl LaunchRequest {
    /// Validate raw tokens and flags into a request
    ///
    /// The first token naming a build mode wins; other tokens are ignored.
    pub fn from_tokens<S: AsRef<str>>(
        program: &str,
        tokens: &[S],
        clean: bool,
        leaks: bool,
    ) -> Result<Self, LaunchError> {
        let mode = tokens
            .iter()
            .find_map(|token| token.as_ref().parse::<BuildMode>().ok())
            .ok_or_else(|| LaunchError::usage(program))?;

        if leaks && !mode.is_debug() {
            return Err(LaunchError::LeaksRequiresDebug);
        }

        Ok(Self { mode, clean, leaks })
    }

    /// Whether an existing build directory must be wiped first
    ///
    /// Leak diagnostics configure with a different flag set, so they always
    /// start from an empty cache.
    pub fn wipes_build_dir(&self) -> bool {
        self.clean || self.leaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_mode_parse_is_exact() {
        assert_eq!("Debug".parse::<BuildMode>(), Ok(BuildMode::Debug));
        assert_eq!("Release".parse::<BuildMode>(), Ok(BuildMode::Release));
        assert!("debug".parse::<BuildMode>().is_err());
        assert!("RelWithDebInfo".parse::<BuildMode>().is_err());
    }

    #[test]
    fn test_first_build_mode_wins() {
        let request =
            LaunchRequest::from_tokens("launch", &["foo", "Release", "Debug"], false, false)
                .unwrap();
        assert_eq!(request.mode, BuildMode::Release);
    }

    #[test]
    fn test_missing_build_mode_is_usage_error() {
        let err = LaunchRequest::from_tokens::<&str>("launch", &[], true, false).unwrap_err();
        assert!(matches!(err, LaunchError::Usage { .. }));

        let err =
            LaunchRequest::from_tokens("launch", &["debug", "--clean"], true, false).unwrap_err();
        assert!(matches!(err, LaunchError::Usage { .. }));
    }

    #[test]
    fn test_leaks_requires_debug() {
        let err = LaunchRequest::from_tokens("launch", &["Release"], false, true).unwrap_err();
        assert!(matches!(err, LaunchError::LeaksRequiresDebug));

        let request = LaunchRequest::from_tokens("launch", &["Debug"], false, true).unwrap();
        assert!(request.leaks);
        assert!(request.wipes_build_dir());
    }

    #[test]
    fn test_wipes_build_dir() {
        let plain = LaunchRequest::from_tokens("launch", &["Debug"], false, false).unwrap();
        assert!(!plain.wipes_build_dir());

        let clean = LaunchRequest::from_tokens("launch", &["Release"], true, false).unwrap();
        assert!(clean.wipes_build_dir());
    }

    #[test]
    fn test_platform_suffix() {
        assert_eq!(Platform::Windows.executable_suffix(), ".exe");
        assert_eq!(Platform::MacOs.executable_suffix(), "");
        assert_eq!(Platform::Linux.executable_suffix(), "");
    }

    #[test]
    fn test_platform_toolchain() {
        assert_eq!(Platform::Windows.default_toolchain(), Some(("Ninja", "clang")));
        assert_eq!(Platform::Linux.default_toolchain(), None);
    }
}
