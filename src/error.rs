//! Error types for shell-exec.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for shell-exec operations.
#[derive(Error, Debug)]
pub enum ShellExecError {
    /// The shell (or the program it was asked to run) could not be started.
    #[error("failed to start command: {0}")]
    SpawnFailed(String),

    /// Command exceeded its allotted time and was killed.
    #[error("command timed out after {secs} seconds")]
    Timeout { secs: u64 },

    /// Command was cancelled by the caller and killed.
    #[error("command cancelled")]
    Cancelled,

    /// Requested file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Requested path exists but is not a regular file.
    #[error("path is not a file: {}", .0.display())]
    NotARegularFile(PathBuf),

    /// Requested path is not readable by this process.
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Requested path resolves outside the configured base directory.
    #[error("path is outside the allowed directory: {}", .0.display())]
    OutsideBaseDirectory(PathBuf),

    /// Tool name is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool input did not match its schema.
    #[error("invalid input for tool '{tool}': {reason}")]
    InvalidToolInput { tool: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShellExecError {
    /// Whether this error belongs to the file hand-off path.
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::NotARegularFile(_)
                | Self::PermissionDenied(_)
                | Self::OutsideBaseDirectory(_)
        )
    }
}

/// Convenience Result type for shell-exec operations.
pub type Result<T> = std::result::Result<T, ShellExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_display() {
        let err = ShellExecError::FileNotFound(PathBuf::from("/tmp/missing.txt"));
        assert!(err.to_string().contains("/tmp/missing.txt"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_timeout_display() {
        let err = ShellExecError::Timeout { secs: 30 };
        assert_eq!(err.to_string(), "command timed out after 30 seconds");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ShellExecError = io_err.into();
        assert!(matches!(err, ShellExecError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_invalid_tool_input_display() {
        let err = ShellExecError::InvalidToolInput {
            tool: "execute_shell_command".into(),
            reason: "missing field `command`".into(),
        };
        assert!(err.to_string().contains("execute_shell_command"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_is_file_error() {
        assert!(ShellExecError::NotARegularFile(PathBuf::from("/tmp")).is_file_error());
        assert!(ShellExecError::PermissionDenied(PathBuf::from("/root/x")).is_file_error());
        assert!(!ShellExecError::Cancelled.is_file_error());
        assert!(!ShellExecError::SpawnFailed("sh".into()).is_file_error());
    }
}
