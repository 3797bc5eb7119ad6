//! Chat-host glue around the executor and file sender.
//!
//! Maps the `shell` / `send_file` triggers and the two LLM tools onto the
//! core components and renders their results as text. No authorization
//! happens here: the host must check the invoking identity first.

mod command;
mod reply;
pub mod tools;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::execution::{CommandExecutor, ExecutionRequest};
use crate::transfer::{FileSendRequest, FileSendResult, FileSender};

pub use command::{ChatCommand, SEND_FILE_TRIGGER, SHELL_TRIGGER};
pub use reply::{
    clip, format_execution, format_file_error, render_output, status_line, Reply, ReplyConfig,
    REPLY_CLIP_MARKER,
};
pub use tools::{tool_definitions, ToolDefinition, ToolResponse, ToolRouter};

/// Entry point for a chat host.
#[derive(Debug, Clone)]
pub struct ShellExecHost {
    executor: Arc<CommandExecutor>,
    sender: Arc<FileSender>,
    reply: ReplyConfig,
}

impl ShellExecHost {
    pub fn new(executor: Arc<CommandExecutor>, sender: Arc<FileSender>, reply: ReplyConfig) -> Self {
        Self {
            executor,
            sender,
            reply,
        }
    }

    /// Build every component from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(CommandExecutor::new(config.executor_config())),
            Arc::new(FileSender::new(config.file_sender_config())),
            config.reply_config(),
        )
    }

    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    pub fn sender(&self) -> &Arc<FileSender> {
        &self.sender
    }

    /// Router for the LLM tools, sharing this host's components.
    pub fn tools(&self) -> ToolRouter {
        ToolRouter::new(
            Arc::clone(&self.executor),
            Arc::clone(&self.sender),
            self.reply.clone(),
        )
    }

    /// Handle a chat message. Returns `None` if it is not a trigger.
    pub async fn handle_message(&self, message: &str) -> Option<Reply> {
        self.handle_message_with_cancel(message, std::future::pending())
            .await
    }

    /// Handle a chat message; a running command stops when `cancel` resolves.
    pub async fn handle_message_with_cancel<F>(&self, message: &str, cancel: F) -> Option<Reply>
    where
        F: Future<Output = ()>,
    {
        let command = ChatCommand::parse(message)?;
        if command.argument().is_empty() {
            return Some(Reply::text(command.usage()));
        }

        let reply = match command {
            ChatCommand::Shell(ref line) => self.run_shell(line, cancel).await,
            ChatCommand::SendFile(ref path) => self.send_file(path).await,
        };
        Some(reply)
    }

    /// Run a command line and render the result.
    pub async fn run_shell<F>(&self, command_line: &str, cancel: F) -> Reply
    where
        F: Future<Output = ()>,
    {
        info!(command = %command_line, "shell trigger received");

        let request = ExecutionRequest::new(command_line);
        let result = self.executor.execute_with_cancel(&request, cancel).await;

        Reply::text(format_execution(&result, &self.reply))
    }

    /// Prepare a file and attach it to the reply.
    pub async fn send_file(&self, path: &str) -> Reply {
        info!(path = %path, "send_file trigger received");

        match self.sender.prepare(&FileSendRequest::new(path)).await {
            FileSendResult::Ready(file) => {
                debug!(name = %file.name(), size = file.size(), "attaching file");
                let text = format!("Sending {} ({} bytes)", file.name(), file.size());
                Reply::with_attachment(text, file)
            }
            FileSendResult::Unavailable { error, .. } => {
                if !error.is_file_error() {
                    warn!(path = %path, error = %error, "unexpected error preparing file");
                }
                Reply::text(format_file_error(&error))
            }
        }
    }
}

impl Default for ShellExecHost {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
