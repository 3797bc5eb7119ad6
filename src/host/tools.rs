//! LLM tool definitions and dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::reply::{format_file_error, render_output, ReplyConfig};
use crate::error::{Result, ShellExecError};
use crate::execution::{default_shell, default_shell_arg, CommandExecutor, ExecutionRequest};
use crate::transfer::{FileSendRequest, FileSendResult, FileSender, PreparedFile};

/// Name of the command execution tool.
pub const EXECUTE_SHELL_COMMAND: &str = "execute_shell_command";

/// Name of the file hand-off tool.
pub const SEND_FILE_BY_PATH: &str = "send_file_by_path";

/// Tool definition handed to the model (name, description, JSON schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result of a tool invocation.
#[derive(Debug)]
pub struct ToolResponse {
    /// JSON payload returned to the model.
    pub content: serde_json::Value,
    /// Whether the call failed or the command did not succeed.
    pub is_error: bool,
    /// File the host must deliver to the channel.
    pub attachment: Option<PreparedFile>,
}

impl ToolResponse {
    /// Error payload carrying a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: json!({ "error": message.into() }),
            is_error: true,
            attachment: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteShellInput {
    command: String,
}

#[derive(Debug, Deserialize)]
struct SendFileInput {
    path: String,
}

/// Definitions of both tools, describing the default shell.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    definitions_for(&format!("{} {}", default_shell(), default_shell_arg()))
}

/// Definitions of both tools, describing `shell` as the interpreter.
fn definitions_for(shell: &str) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: EXECUTE_SHELL_COMMAND.to_string(),
            description: format!(
                "Execute a shell command on the host via {}. \
                Pipes, redirection and chaining are supported. Stdin is closed, \
                so interactive programs receive end-of-file. Returns exit_code, \
                stdout, stderr and timed_out.",
                shell
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The shell command line to execute"
                    }
                },
                "required": ["command"]
            }),
        },
        ToolDefinition {
            name: SEND_FILE_BY_PATH.to_string(),
            description: "Send a file from the host filesystem to the current chat. \
                Accepts an absolute path, a path starting with ~, or a relative path."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Absolute or relative path of the file to send"
                    }
                },
                "required": ["path"]
            }),
        },
    ]
}

/// Dispatches tool calls to the executor and file sender.
///
/// Callers must authorize the invoking identity before dispatching.
#[derive(Debug, Clone)]
pub struct ToolRouter {
    executor: Arc<CommandExecutor>,
    sender: Arc<FileSender>,
    reply: ReplyConfig,
}

impl ToolRouter {
    pub fn new(executor: Arc<CommandExecutor>, sender: Arc<FileSender>, reply: ReplyConfig) -> Self {
        Self {
            executor,
            sender,
            reply,
        }
    }

    /// Definitions naming the shell this router's executor actually runs.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let config = self.executor.config();
        definitions_for(&format!("{} {}", config.shell.display(), config.shell_arg))
    }

    /// Invoke a tool by name with JSON input.
    ///
    /// Unknown tools and malformed input are errors; command failures and
    /// missing files are reported inside the [`ToolResponse`].
    pub async fn invoke(&self, name: &str, input: serde_json::Value) -> Result<ToolResponse> {
        match name {
            EXECUTE_SHELL_COMMAND => {
                let ExecuteShellInput { command } = parse_input(name, input)?;
                if command.trim().is_empty() {
                    return Err(invalid(name, "command must not be empty"));
                }
                Ok(self.execute_shell_command(&command).await)
            }
            SEND_FILE_BY_PATH => {
                let SendFileInput { path } = parse_input(name, input)?;
                if path.trim().is_empty() {
                    return Err(invalid(name, "path must not be empty"));
                }
                Ok(self.send_file_by_path(&path).await)
            }
            other => Err(ShellExecError::UnknownTool(other.to_string())),
        }
    }

    /// Like [`invoke`](Self::invoke), but turns every error into a response.
    pub async fn invoke_or_explain(&self, name: &str, input: serde_json::Value) -> ToolResponse {
        match self.invoke(name, input).await {
            Ok(response) => response,
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call rejected");
                ToolResponse::error(e.to_string())
            }
        }
    }

    async fn execute_shell_command(&self, command: &str) -> ToolResponse {
        info!(command = %command, "tool requested command execution");

        let result = self.executor.execute(&ExecutionRequest::new(command)).await;
        let max = self.reply.max_reply_chars;

        ToolResponse {
            content: json!({
                "exit_code": result.exit_code,
                "stdout": render_output(&result.stdout, max),
                "stderr": render_output(&result.stderr, max),
                "timed_out": result.timed_out,
                "status": result.status,
            }),
            is_error: !result.success(),
            attachment: None,
        }
    }

    async fn send_file_by_path(&self, path: &str) -> ToolResponse {
        info!(path = %path, "tool requested file");

        match self.sender.prepare(&FileSendRequest::new(path)).await {
            FileSendResult::Ready(file) => ToolResponse {
                content: json!({
                    "sent": true,
                    "file_name": file.name(),
                    "size_bytes": file.size(),
                }),
                is_error: false,
                attachment: Some(file),
            },
            FileSendResult::Unavailable { error, .. } => ToolResponse {
                content: json!({
                    "sent": false,
                    "error": format_file_error(&error),
                }),
                is_error: true,
                attachment: None,
            },
        }
    }
}

fn parse_input<T: for<'de> Deserialize<'de>>(tool: &str, input: serde_json::Value) -> Result<T> {
    serde_json::from_value(input).map_err(|e| invalid(tool, &e.to_string()))
}

fn invalid(tool: &str, reason: &str) -> ShellExecError {
    ShellExecError::InvalidToolInput {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}
