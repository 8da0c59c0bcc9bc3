//! Unified error type for stickerforge.
//!
//! Every failure in the conversion flow funnels into [`Error`], which carries
//! enough context for the HTTP layer to derive a status code via
//! [`Error::http_status`] and for the CLI to print a useful message.

use std::fmt;

/// Unified error type covering all failure modes of a conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request carried no file part, or the file had no name.
    #[error("{0}")]
    MissingFile(String),

    /// The upload's extension is not in the allow-set.
    #[error("Invalid file type. Allowed: {allowed}")]
    UnsupportedFormat {
        /// Lowercased extension that was rejected (empty when absent).
        extension: String,
        /// Comma-separated list of accepted extensions.
        allowed: String,
    },

    /// A form parameter could not be coerced or is out of its domain.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Form field name.
        name: String,
        /// Human-readable description of the violated constraint.
        message: String,
    },

    /// The transcoder ran and reported failure.
    #[error("Conversion failed: {diagnostic}")]
    TranscodeFailed {
        /// Captured diagnostic output of the transcoder.
        diagnostic: String,
    },

    /// The transcoder could not be run to completion (spawn, wait, timeout).
    #[error("Failed to run {tool}: {message}")]
    Invocation {
        /// Name of the tool that was being run.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The requested artifact does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "artifact").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for anything nobody anticipated.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::MissingFile(_) => 400,
            Error::UnsupportedFormat { .. } => 400,
            Error::InvalidParameter { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::TranscodeFailed { .. } => 500,
            Error::Invocation { .. } => 500,
            Error::Io { .. } => 500,
            Error::Unexpected(_) => 500,
        }
    }

    /// Whether the caller caused this error.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Stable machine-readable code for API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingFile(_) => "missing_file",
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::InvalidParameter { .. } => "invalid_parameter",
            Error::TranscodeFailed { .. } => "transcode_failed",
            Error::Invocation { .. } => "invocation_error",
            Error::NotFound { .. } => "not_found",
            Error::Io { .. } | Error::Unexpected(_) => "unexpected",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Invocation`].
    pub fn invocation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Invocation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::TranscodeFailed`].
    pub fn transcode_failed(diagnostic: impl Into<String>) -> Self {
        Error::TranscodeFailed {
            diagnostic: diagnostic.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn missing_file_display() {
        let err = Error::MissingFile("No video file provided".into());
        assert_eq!(err.to_string(), "No video file provided");
        assert_eq!(err.http_status(), 400);
        assert!(err.is_client_error());
    }

    #[test]
    fn unsupported_format_display() {
        let err = Error::UnsupportedFormat {
            extension: "txt".into(),
            allowed: "mp4, gif".into(),
        };
        assert_eq!(err.to_string(), "Invalid file type. Allowed: mp4, gif");
        assert_eq!(err.code(), "unsupported_format");
    }

    #[test]
    fn invalid_parameter_display() {
        let err = Error::invalid_parameter("speed", "expected a number");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'speed': expected a number"
        );
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn transcode_failed_carries_diagnostic() {
        let err = Error::transcode_failed("Unknown encoder 'libwebp'");
        assert_eq!(
            err.to_string(),
            "Conversion failed: Unknown encoder 'libwebp'"
        );
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_client_error());
    }

    #[test]
    fn invocation_display() {
        let err = Error::invocation("ffmpeg", "failed to spawn: No such file");
        assert_eq!(
            err.to_string(),
            "Failed to run ffmpeg: failed to spawn: No such file"
        );
        assert_eq!(err.code(), "invocation_error");
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("artifact", "abc-123");
        assert_eq!(err.to_string(), "artifact not found: abc-123");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::from(io_err);
        assert_matches!(err, Error::Io { .. });
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.code(), "unexpected");
    }
}
