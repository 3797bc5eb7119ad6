//! # shell-exec
//!
//! Bounded shell command execution and file hand-off for chat-bot hosts.
//!
//! The crate has two independent cores:
//!
//! - [`execution`]: runs a command line through the shell in its own process
//!   group, races it against a timeout, kills the whole group when time runs
//!   out, and captures capped stdout/stderr.
//! - [`transfer`]: checks that a path names a readable regular file and opens
//!   it for chunked streaming.
//!
//! [`host`] wires both into chat triggers (`shell`, `send_file`) and LLM
//! tools (`execute_shell_command`, `send_file_by_path`). None of these layers
//! authorizes anyone; that is the host's job.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shell_exec::{CommandExecutor, ExecutionRequest, ExecutorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     shell_exec::logging::try_init(None).ok();
//!
//!     let executor = CommandExecutor::new(ExecutorConfig::default());
//!     let result = executor
//!         .execute(&ExecutionRequest::new("uname -a").timeout_secs(5))
//!         .await;
//!
//!     println!("{:?}: {}", result.status, result.stdout_text());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod host;
pub mod logging;
pub mod output;
pub mod transfer;

// Re-export commonly used types
pub use error::{Result, ShellExecError};
pub use execution::{
    CommandExecutor, ExecutionRequest, ExecutionResult, ExecutionStatus, ExecutorConfig,
    OutputMode, SpawnFailure,
};
pub use host::{ChatCommand, Reply, ShellExecHost, ToolRouter};
pub use output::OutputSanitizer;
pub use transfer::{FileSendRequest, FileSendResult, FileSender, FileSenderConfig, PreparedFile};
