//! Bounded command execution.
//!
//! Every command runs through a shell in its own process group. The child's
//! exit is raced against a timer (and an optional cancellation future); if
//! the timer wins, the whole group is killed with SIGKILL and reaped.
//! Output is captured up to a cap and marked when truncated.
//!
//! The executor enforces no content-based restriction on what it runs.
//! Callers are expected to authorize the operator before invoking it.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use shell_exec::execution::{CommandExecutor, ExecutionRequest, ExecutorConfig};
//!
//! # async fn demo() {
//! let executor = CommandExecutor::new(ExecutorConfig::default());
//! let request = ExecutionRequest::new("ls -la | wc -l").timeout(Duration::from_secs(5));
//! let result = executor.execute(&request).await;
//! println!("exit={:?} stdout={}", result.exit_code, result.stdout_text());
//! # }
//! ```

mod capture;
mod executor;
mod process;
mod request;
mod result;

pub use capture::{CappedBuffer, OutputMode, OutputSource, TRUNCATION_MARKER};
pub use executor::{
    default_shell, default_shell_arg, execute_with_timeout, CommandExecutor, ExecutorConfig,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT, DRAIN_GRACE,
};
pub use request::ExecutionRequest;
pub use result::{CapturedOutput, ExecutionResult, ExecutionStatus, SpawnFailure};
