//! External tool detection.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use stickerforge_common::{Error, Result};

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string (first line of the version output) if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// `program` may be a bare name (looked up in `PATH`) or a path. ffmpeg-style
/// tools take `-version`; everything else gets `--version`.
///
/// # Example
///
/// ```no_run
/// use stickerforge_av::check_tool;
///
/// let info = check_tool("ffmpeg");
/// if info.available {
///     println!("ffmpeg version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(program: impl AsRef<Path>) -> ToolInfo {
    let program = program.as_ref();
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string_lossy().to_string());

    let version_arg = if name.starts_with("ff") {
        "-version"
    } else {
        "--version"
    };

    match Command::new(program).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name,
                available: true,
                version,
                path: which::which(program).ok(),
            }
        }
        _ => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Get the path to a tool, preferring a configured path over `PATH` lookup.
///
/// A configured path that does not exist falls back to `PATH` with a warning.
///
/// # Errors
///
/// Returns [`Error::Invocation`] if the tool cannot be found at all.
pub fn resolve_tool_path(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured {name} path {} does not exist; falling back to PATH",
            path.display()
        );
    }

    which::which(name)
        .map_err(|_| Error::invocation(name, format!("{name} not found; is it installed and in PATH?")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345");
        assert!(!info.available);
        assert_eq!(info.name, "nonexistent_tool_12345");
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn resolve_missing_tool_returns_invocation_error() {
        let err = resolve_tool_path("nonexistent_tool_xyz", None).unwrap_err();
        assert!(matches!(err, Error::Invocation { .. }));
    }

    #[test]
    fn resolve_prefers_existing_configured_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_tool_path("nonexistent_tool_xyz", Some(file.path())).unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn tool_info_serializes() {
        let info = check_tool("nonexistent_tool_12345");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["available"], false);
    }
}
