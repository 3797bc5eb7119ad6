//! Command execution engine.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tokio::process::Child;
use tracing::{debug, info, warn};

use super::capture::{Capture, OutputMode};
use super::process::{spawn_in_group, termination_signal, ProcessGroupGuard};
use super::request::ExecutionRequest;
use super::result::{ExecutionResult, ExecutionStatus, SpawnFailure};

/// Default execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-stream capture cap.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// How long to wait for pipe EOF once the child has been reaped.
pub const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Exit status a POSIX shell uses when the program was not found.
const SHELL_NOT_FOUND: i32 = 127;

/// Exit status a POSIX shell uses when the program could not be executed.
const SHELL_NOT_EXECUTABLE: i32 = 126;

/// Shell diagnostics (dash, bash, zsh, busybox) for a missing program.
const NOT_FOUND_MARKERS: &[&str] = &["not found", "no such file or directory"];

/// Shell diagnostics for a program that exists but cannot be run.
const NOT_EXECUTABLE_MARKERS: &[&str] = &["permission denied", "cannot execute", "is a directory"];

/// Executor configuration.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Timeout for requests that do not carry their own.
    pub default_timeout: Duration,
    /// Emit an audit event per execution.
    pub enable_logging: bool,
    /// Capture cap in bytes (per stream in split mode).
    pub max_output_bytes: usize,
    /// Split or combined capture.
    pub output_mode: OutputMode,
    /// Shell interpreter.
    pub shell: PathBuf,
    /// Flag that makes the shell read the command from its next argument.
    pub shell_arg: String,
    /// Working directory for requests that do not carry their own.
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            enable_logging: true,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            output_mode: OutputMode::Split,
            shell: PathBuf::from(default_shell()),
            shell_arg: default_shell_arg().to_string(),
            working_dir: None,
        }
    }
}

#[cfg(unix)]
pub fn default_shell() -> &'static str {
    "/bin/sh"
}

#[cfg(windows)]
pub fn default_shell() -> &'static str {
    "cmd.exe"
}

#[cfg(unix)]
pub fn default_shell_arg() -> &'static str {
    "-c"
}

#[cfg(windows)]
pub fn default_shell_arg() -> &'static str {
    "/C"
}

enum Race {
    Exited(io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Resolution known before output is drained.
enum Outcome {
    /// Exited on its own; classified once the output is in.
    Exited(ExitStatus, Duration),
    Resolved(ExecutionResult),
}

/// Runs shell command lines with a bounded wall-clock time.
///
/// The executor holds no per-call state; one instance can serve any number
/// of concurrent executions.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    config: ExecutorConfig,
}

impl CommandExecutor {
    /// Create a new command executor.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a request to completion or timeout.
    ///
    /// Never fails: spawn errors, timeouts and non-zero exits are all
    /// reported through the returned [`ExecutionResult`].
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.execute_with_cancel(request, std::future::pending()).await
    }

    /// Like [`execute`](Self::execute), but also stops when `cancel` resolves.
    ///
    /// Cancellation kills the process group through the same path as a
    /// timeout and yields [`ExecutionStatus::Cancelled`].
    pub async fn execute_with_cancel<F>(&self, request: &ExecutionRequest, cancel: F) -> ExecutionResult
    where
        F: Future<Output = ()>,
    {
        let timeout = request.effective_timeout(self.config.default_timeout);
        let result = self.run(request, timeout, cancel).await;
        self.audit(request, timeout, &result);
        result
    }

    async fn run<F>(&self, request: &ExecutionRequest, timeout: Duration, cancel: F) -> ExecutionResult
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let working_dir = request
            .working_directory()
            .or(self.config.working_dir.as_deref());

        if let Some(dir) = working_dir {
            if !is_directory(dir).await {
                return ExecutionResult::spawn_failed(
                    SpawnFailure::WorkingDirectory,
                    format!(
                        "working directory does not exist or is not a directory: {}",
                        dir.display()
                    ),
                    start.elapsed(),
                );
            }
        }

        debug!(
            command = %request.command(),
            timeout_secs = timeout.as_secs_f64(),
            shell = %self.config.shell.display(),
            "spawning command"
        );

        let mut child = match spawn_in_group(
            &self.config.shell,
            &self.config.shell_arg,
            request,
            working_dir,
        ) {
            Ok(child) => child,
            Err(e) => {
                let reason = match e.kind() {
                    io::ErrorKind::NotFound => SpawnFailure::ShellUnavailable,
                    io::ErrorKind::PermissionDenied => SpawnFailure::PermissionDenied,
                    _ => SpawnFailure::Other,
                };
                return ExecutionResult::spawn_failed(
                    reason,
                    format!("failed to start {}: {}", self.config.shell.display(), e),
                    start.elapsed(),
                );
            }
        };

        let mut guard = ProcessGroupGuard::new(&child);
        let capture = Capture::start(
            child.stdout.take(),
            child.stderr.take(),
            self.config.output_mode,
            self.config.max_output_bytes,
        );

        tokio::pin!(cancel);
        let race = tokio::select! {
            status = child.wait() => Race::Exited(status),
            _ = tokio::time::sleep(timeout) => Race::TimedOut,
            _ = &mut cancel => Race::Cancelled,
        };

        let outcome = match race {
            Race::Exited(Ok(status)) => Outcome::Exited(status, start.elapsed()),
            Race::Exited(Err(e)) => {
                terminate(&mut guard, &mut child).await;
                Outcome::Resolved(ExecutionResult::spawn_failed(
                    SpawnFailure::Other,
                    format!("failed to wait for command: {}", e),
                    start.elapsed(),
                ))
            }
            Race::TimedOut => {
                debug!(timeout_secs = timeout.as_secs_f64(), "timeout elapsed, killing process group");
                terminate(&mut guard, &mut child).await;
                Outcome::Resolved(ExecutionResult::timeout(timeout, start.elapsed()))
            }
            Race::Cancelled => {
                debug!("execution cancelled, killing process group");
                terminate(&mut guard, &mut child).await;
                Outcome::Resolved(ExecutionResult::cancelled(start.elapsed()))
            }
        };
        guard.disarm();

        let (stdout, stderr) = capture.finish(DRAIN_GRACE).await;
        let result = match outcome {
            Outcome::Exited(status, duration) => {
                // In combined mode the shell's diagnostic lands in stdout.
                let diagnostics = match self.config.output_mode {
                    OutputMode::Split => &stderr.bytes,
                    OutputMode::Combined => &stdout.bytes,
                };
                classify(status, duration, diagnostics)
            }
            Outcome::Resolved(result) => result,
        };
        result.with_output(stdout, stderr)
    }

    fn audit(&self, request: &ExecutionRequest, timeout: Duration, result: &ExecutionResult) {
        if !self.config.enable_logging {
            return;
        }

        if result.timed_out {
            warn!(
                command = %request.command(),
                timeout_secs = timeout.as_secs(),
                duration_ms = result.duration_millis(),
                stdout_bytes = result.stdout.len(),
                stderr_bytes = result.stderr.len(),
                "command timed out"
            );
        } else {
            info!(
                command = %request.command(),
                status = ?result.status,
                exit_code = ?result.exit_code,
                duration_ms = result.duration_millis(),
                stdout_bytes = result.stdout.len(),
                stderr_bytes = result.stderr.len(),
                truncated = result.stdout_truncated || result.stderr_truncated,
                "command executed"
            );
        }
    }
}

/// Kill the whole group and reap the leader.
async fn terminate(guard: &mut ProcessGroupGuard, child: &mut Child) {
    guard.terminate(child);
    if let Err(e) = child.wait().await {
        debug!(error = %e, "failed to reap killed child");
    }
}

/// Map an exit status to a result.
///
/// Status 127/126 only counts as a spawn failure when the shell's own
/// diagnostic is the last line of `diagnostics`; a command that merely
/// exits with that code is a normal result.
fn classify(status: ExitStatus, duration: Duration, diagnostics: &[u8]) -> ExecutionResult {
    match status.code() {
        Some(SHELL_NOT_FOUND) if shell_reported(diagnostics, NOT_FOUND_MARKERS) => {
            ExecutionResult::spawn_failed(
                SpawnFailure::CommandNotFound,
                "command not found: the shell could not locate the program (status 127)",
                duration,
            )
        }
        Some(SHELL_NOT_EXECUTABLE) if shell_reported(diagnostics, NOT_EXECUTABLE_MARKERS) => {
            ExecutionResult::spawn_failed(
                SpawnFailure::NotExecutable,
                "command not executable: the shell could not run the program (status 126)",
                duration,
            )
        }
        Some(code) => ExecutionResult::completed(ExecutionStatus::Exited(code), duration),
        None => {
            let signal = termination_signal(&status).unwrap_or(-1);
            ExecutionResult::completed(ExecutionStatus::Signaled(signal), duration)
        }
    }
}

/// Whether the last non-empty line of `output` carries one of `markers`.
fn shell_reported(output: &[u8], markers: &[&str]) -> bool {
    let text = String::from_utf8_lossy(output);
    let Some(last) = text.lines().rev().find(|l| !l.trim().is_empty()) else {
        return false;
    };
    let last = last.to_ascii_lowercase();
    markers.iter().any(|m| last.contains(m))
}

async fn is_directory(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// One-shot execution with default settings and the given timeout.
pub async fn execute_with_timeout(command_line: &str, timeout: Duration) -> ExecutionResult {
    let request = ExecutionRequest::new(command_line).timeout(timeout);
    CommandExecutor::default().execute(&request).await
}
