//! Tool detection with actionable errors
//!
//! CMake and the diagnostics tool are located on PATH up front, so a missing
//! install fails before anything is deleted or configured.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::{hints, LaunchError};
use crate::exec::subprocess::resolve_program;

/// Tool detection result
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Path to the tool executable
    pub path: PathBuf,
}

/// Check if a tool exists and return its information
pub fn check_tool(tool_name: &str) -> Option<ToolInfo> {
    resolve_program(Path::new(tool_name)).map(|path| ToolInfo {
        name: tool_name.to_string(),
        path,
    })
}

/// Require a tool to exist, return error with hint if missing
pub fn require_tool(tool_name: &str, required_for: &str) -> Result<ToolInfo> {
    match check_tool(tool_name) {
        Some(info) => {
            tracing::debug!(tool = %info.name, path = %info.path.display(), "found tool");
            Ok(info)
        }
        None => Err(LaunchError::missing_tool(tool_name, required_for, get_tool_hint(tool_name)).into()),
    }
}

/// Get installation hint for a tool
fn get_tool_hint(tool_name: &str) -> &'static str {
    match tool_name {
        "cmake" => hints::cmake(),
        "footprint" | "leaks" | "heap" | "malloc_history" => hints::diagnostics_tool(),
        _ => "Install this tool and ensure it's in your PATH",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_error() {
        let err = require_tool("sokobee-no-such-tool", "testing").unwrap_err();
        match err.downcast_ref::<LaunchError>() {
            Some(LaunchError::MissingTool {
                tool, required_for, ..
            }) => {
                assert_eq!(tool, "sokobee-no-such-tool");
                assert_eq!(required_for, "testing");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_check_common_tool() {
        assert!(check_tool("sh").is_some());
    }

    #[test]
    fn test_tool_hints() {
        assert_eq!(get_tool_hint("cmake"), hints::cmake());
        assert_eq!(get_tool_hint("footprint"), hints::diagnostics_tool());
    }
}
