//! Rendering execution and file results as chat text.

use crate::error::ShellExecError;
use crate::execution::{ExecutionResult, ExecutionStatus};
use crate::output::OutputSanitizer;
use crate::transfer::PreparedFile;

/// Marker appended to a block clipped to the reply limit.
pub const REPLY_CLIP_MARKER: &str = "\n... [truncated]";

/// Reply rendering settings.
#[derive(Debug, Clone)]
pub struct ReplyConfig {
    /// Maximum characters per output block.
    pub max_reply_chars: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_reply_chars: 4000,
        }
    }
}

/// A reply for the requesting channel.
#[derive(Debug)]
pub struct Reply {
    /// Message text.
    pub text: String,
    /// File to attach, owned by the host until it has been sent.
    pub attachment: Option<PreparedFile>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(text: impl Into<String>, file: PreparedFile) -> Self {
        Self {
            text: text.into(),
            attachment: Some(file),
        }
    }
}

/// Clip `text` to `max_chars` characters, appending [`REPLY_CLIP_MARKER`].
pub fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &text[..idx], REPLY_CLIP_MARKER),
        None => text.to_string(),
    }
}

/// Captured bytes as clean, trimmed, clipped reply text.
pub fn render_output(bytes: &[u8], max_chars: usize) -> String {
    let text = OutputSanitizer::to_plain_text(bytes);
    clip(text.trim(), max_chars)
}

/// One-line description of how the execution ended.
pub fn status_line(result: &ExecutionResult) -> String {
    match result.status {
        ExecutionStatus::Exited(code) => format!("Exit code: {}", code),
        ExecutionStatus::Signaled(signal) => format!("Terminated by signal {}", signal),
        ExecutionStatus::TimedOut => format!(
            "Timed out after {} seconds",
            result.time_limit.unwrap_or_default().as_secs()
        ),
        ExecutionStatus::Cancelled => "Cancelled".to_string(),
        ExecutionStatus::SpawnFailed(reason) => format!("Failed to start: {}", reason),
    }
}

/// Full chat reply for a `shell` trigger.
pub fn format_execution(result: &ExecutionResult, config: &ReplyConfig) -> String {
    let stdout = render_output(&result.stdout, config.max_reply_chars);
    let stderr = render_output(&result.stderr, config.max_reply_chars);

    let mut parts = Vec::with_capacity(3);
    if !stdout.is_empty() {
        parts.push(format!("Output:\n```\n{}\n```", stdout));
    }
    if !stderr.is_empty() {
        parts.push(format!("Errors:\n```\n{}\n```", stderr));
    }
    if parts.is_empty() {
        parts.push("Command finished with no output.".to_string());
    }
    parts.push(status_line(result));

    parts.join("\n\n")
}

/// Human-readable reason a file could not be sent.
pub fn format_file_error(error: &ShellExecError) -> String {
    match error {
        ShellExecError::FileNotFound(p) => format!("File not found: {}", p.display()),
        ShellExecError::NotARegularFile(p) => format!("Path is not a file: {}", p.display()),
        ShellExecError::PermissionDenied(p) => format!("Permission denied: {}", p.display()),
        ShellExecError::OutsideBaseDirectory(p) => {
            format!("Path is outside the allowed directory: {}", p.display())
        }
        other => format!("Error while sending file: {}", other),
    }
}
