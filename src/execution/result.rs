//! Execution result types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::ShellExecError;

/// Why a command could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnFailure {
    /// The shell interpreter itself is missing.
    ShellUnavailable,
    /// The requested working directory does not exist or is not a directory.
    WorkingDirectory,
    /// The shell could not be executed by this process.
    PermissionDenied,
    /// The shell could not find the requested program (status 127).
    CommandNotFound,
    /// The requested program exists but is not executable (status 126).
    NotExecutable,
    /// Any other OS-level spawn error.
    Other,
}

impl fmt::Display for SpawnFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ShellUnavailable => "shell unavailable",
            Self::WorkingDirectory => "invalid working directory",
            Self::PermissionDenied => "permission denied",
            Self::CommandNotFound => "command not found",
            Self::NotExecutable => "command not executable",
            Self::Other => "spawn error",
        };
        f.write_str(text)
    }
}

/// How an execution was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Process exited on its own with this code.
    Exited(i32),
    /// Process was terminated by a signal it did not get from us.
    Signaled(i32),
    /// Process group was killed after the timeout elapsed.
    TimedOut,
    /// Process group was killed because the caller cancelled.
    Cancelled,
    /// Nothing ran.
    SpawnFailed(SpawnFailure),
}

/// Result of one command execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Exit code, absent when the process did not exit on its own.
    pub exit_code: Option<i32>,
    /// Captured standard output (combined output in combined mode).
    #[serde(skip)]
    pub stdout: Vec<u8>,
    /// Captured standard error, or the spawn failure explanation.
    #[serde(skip)]
    pub stderr: Vec<u8>,
    /// Whether the process was killed by the timeout.
    pub timed_out: bool,
    /// Wall-clock time from launch to resolution.
    #[serde(skip)]
    pub duration: Duration,
    /// Resolution of the execution.
    pub status: ExecutionStatus,
    /// Whether stdout hit the capture cap.
    pub stdout_truncated: bool,
    /// Whether stderr hit the capture cap.
    pub stderr_truncated: bool,
    /// The limit that expired, set only on timed-out results.
    #[serde(skip)]
    pub time_limit: Option<Duration>,
}

impl ExecutionResult {
    /// Result for a process that exited or was signaled.
    pub fn completed(status: ExecutionStatus, duration: Duration) -> Self {
        let exit_code = match status {
            ExecutionStatus::Exited(code) => Some(code),
            _ => None,
        };
        Self {
            exit_code,
            stdout: Vec::new(),
            stderr: Vec::new(),
            timed_out: false,
            duration,
            status,
            stdout_truncated: false,
            stderr_truncated: false,
            time_limit: None,
        }
    }

    /// Create a result for a process group killed once `limit` expired.
    pub fn timeout(limit: Duration, duration: Duration) -> Self {
        Self {
            timed_out: true,
            time_limit: Some(limit),
            ..Self::completed(ExecutionStatus::TimedOut, duration)
        }
    }

    /// Create a result indicating caller cancellation.
    pub fn cancelled(duration: Duration) -> Self {
        Self::completed(ExecutionStatus::Cancelled, duration)
    }

    /// Create a result for a command that never ran.
    ///
    /// The explanation is placed in `stderr`.
    pub fn spawn_failed(reason: SpawnFailure, message: impl AsRef<str>, duration: Duration) -> Self {
        Self {
            stderr: message.as_ref().as_bytes().to_vec(),
            ..Self::completed(ExecutionStatus::SpawnFailed(reason), duration)
        }
    }

    /// Attach captured output.
    pub fn with_output(mut self, stdout: CapturedOutput, stderr: CapturedOutput) -> Self {
        self.stdout_truncated = stdout.truncated;
        self.stderr_truncated = stderr.truncated;
        self.stdout = stdout.bytes;
        if self.stderr.is_empty() {
            self.stderr = stderr.bytes;
        } else {
            let mut merged = stderr.bytes;
            if !merged.is_empty() && !merged.ends_with(b"\n") {
                merged.push(b'\n');
            }
            merged.extend_from_slice(&self.stderr);
            self.stderr = merged;
        }
        self
    }

    /// Check if command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Check if the command could not be started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self.status, ExecutionStatus::SpawnFailed(_))
    }

    /// Whether the process group was killed by us.
    pub fn terminated(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::TimedOut | ExecutionStatus::Cancelled
        )
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Stdout decoded lossily.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// The exceptional condition behind this result, if any.
    ///
    /// A non-zero exit code is not an error and yields `None`.
    pub fn error(&self) -> Option<ShellExecError> {
        match self.status {
            ExecutionStatus::TimedOut => Some(ShellExecError::Timeout {
                secs: self.time_limit.unwrap_or_default().as_secs(),
            }),
            ExecutionStatus::Cancelled => Some(ShellExecError::Cancelled),
            ExecutionStatus::SpawnFailed(_) => {
                Some(ShellExecError::SpawnFailed(self.stderr_text().trim().to_string()))
            }
            ExecutionStatus::Exited(_) | ExecutionStatus::Signaled(_) => None,
        }
    }
}

/// Bytes captured from one output stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Captured bytes, with the truncation marker appended if `truncated`.
    pub bytes: Vec<u8>,
    /// Whether bytes past the cap were discarded.
    pub truncated: bool,
}
