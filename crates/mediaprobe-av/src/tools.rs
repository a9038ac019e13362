//! Probe executable discovery and availability checks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;

/// Name of the probe executable looked up on the search path.
pub const FFPROBE: &str = "ffprobe";

/// Deadline for `-version` checks.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Availability information for a tool, returned by [`check_tool`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Pick the probe executable.
///
/// An override is used verbatim. Otherwise `ffprobe` is looked up with
/// [`which::which`]; if that fails the bare name is returned so that
/// spawning it reports a proper not-found error.
pub fn resolve_ffprobe(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    match which::which(FFPROBE) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("{FFPROBE} not found on PATH: {e}");
            PathBuf::from(FFPROBE)
        }
    }
}

/// Short display name for a program path (its final component).
pub fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned())
}

/// Check whether `program` can be run and report its version.
pub fn check_tool(program: &Path) -> ToolInfo {
    let name = tool_name(program);
    match which::which(program) {
        Ok(path) => {
            let version = detect_version(&path);
            ToolInfo {
                name,
                available: true,
                version,
                path: Some(path),
            }
        }
        Err(e) => {
            tracing::debug!(tool = %name, "not available: {e}");
            ToolInfo {
                name,
                available: false,
                version: None,
                path: None,
            }
        }
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = ToolCommand::new(path)
        .arg("-version")
        .timeout(VERSION_TIMEOUT)
        .execute_blocking()
        .ok()?;

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_used_verbatim() {
        let path = resolve_ffprobe(Some(Path::new("/opt/custom/ffprobe")));
        assert_eq!(path, PathBuf::from("/opt/custom/ffprobe"));
    }

    #[test]
    fn default_resolution_names_ffprobe() {
        // Whether or not ffprobe is installed, the result names it.
        let path = resolve_ffprobe(None);
        assert_eq!(tool_name(&path), FFPROBE);
    }

    #[test]
    fn tool_name_from_path() {
        assert_eq!(tool_name(Path::new("/usr/bin/ffprobe")), "ffprobe");
        assert_eq!(tool_name(Path::new("ffprobe")), "ffprobe");
    }

    #[test]
    fn missing_tool_is_unavailable() {
        let info = check_tool(Path::new("nonexistent_tool_xyz_12345"));
        assert_eq!(info.name, "nonexistent_tool_xyz_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn reports_first_version_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ffprobe");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'ffprobe version 6.1 Copyright (c) 2007-2023'\necho 'built with gcc'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let info = check_tool(&script);
        assert!(info.available);
        assert_eq!(
            info.version.as_deref(),
            Some("ffprobe version 6.1 Copyright (c) 2007-2023")
        );
        assert!(info.path.is_some());
    }

    #[test]
    fn tool_info_serialization() {
        let info = ToolInfo {
            name: "ffprobe".to_string(),
            available: true,
            version: Some("ffprobe version 6.1".to_string()),
            path: Some(PathBuf::from("/usr/bin/ffprobe")),
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: ToolInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
