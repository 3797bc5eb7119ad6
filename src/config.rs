//! Configuration management for shell-exec.
//!
//! Configuration is loaded once at startup with the following priority
//! (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values
//!
//! The loaded [`Config`] is then split into the immutable per-component
//! values ([`ExecutorConfig`], [`FileSenderConfig`], [`ReplyConfig`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::execution::{default_shell, default_shell_arg, ExecutorConfig, OutputMode};
use crate::host::ReplyConfig;
use crate::transfer::{FileSenderConfig, DEFAULT_CHUNK_SIZE};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command execution settings.
    pub execution: ExecutionSection,
    /// File hand-off settings.
    pub file_send: FileSendSection,
    /// Chat reply rendering.
    pub reply: ReplySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Command execution section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Timeout in seconds for every command.
    pub max_execution_time: u64,
    /// Log every executed command.
    pub enable_logging: bool,
    /// Capture cap in bytes.
    pub max_output_bytes: usize,
    /// `split` or `combined`.
    pub output_mode: OutputMode,
    /// Shell interpreter path.
    pub shell: String,
    /// Default working directory.
    pub working_directory: Option<PathBuf>,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            max_execution_time: 30,
            enable_logging: true,
            max_output_bytes: 1024 * 1024,
            output_mode: OutputMode::Split,
            shell: default_shell().to_string(),
            working_directory: None,
        }
    }
}

/// File hand-off section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSendSection {
    /// Restrict `send_file` to this directory.
    pub base_directory: Option<PathBuf>,
    /// Streaming chunk size in bytes.
    pub chunk_size: usize,
}

impl Default for FileSendSection {
    fn default() -> Self {
        Self {
            base_directory: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Reply rendering section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplySection {
    /// Maximum characters of output per fenced block in a reply.
    pub max_reply_chars: usize,
}

impl Default for ReplySection {
    fn default() -> Self {
        Self {
            max_reply_chars: 4000,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level or filter directive (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(secs) = std::env::var("SHELL_EXEC_MAX_EXECUTION_TIME") {
            self.execution.max_execution_time = secs.parse().map_err(|_| {
                ConfigError::InvalidValue("SHELL_EXEC_MAX_EXECUTION_TIME", secs.clone())
            })?;
        }

        if let Ok(flag) = std::env::var("SHELL_EXEC_ENABLE_LOGGING") {
            self.execution.enable_logging = parse_bool(&flag)
                .ok_or(ConfigError::InvalidValue("SHELL_EXEC_ENABLE_LOGGING", flag))?;
        }

        if let Ok(dir) = std::env::var("SHELL_EXEC_BASE_DIR") {
            if !dir.is_empty() {
                self.file_send.base_directory = Some(PathBuf::from(dir));
            }
        }

        if let Ok(level) = std::env::var("SHELL_EXEC_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(secs) = args.timeout {
            self.execution.max_execution_time = secs;
        }

        if let Some(ref dir) = args.base_dir {
            self.file_send.base_directory = Some(dir.clone());
        }

        if args.combine_output {
            self.execution.output_mode = OutputMode::Combined;
        }

        if args.no_command_log {
            self.execution.enable_logging = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env()?;
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.max_execution_time == 0 {
            return Err(ConfigError::InvalidValue("max_execution_time", "0".into()));
        }
        if self.execution.max_output_bytes == 0 {
            return Err(ConfigError::InvalidValue("max_output_bytes", "0".into()));
        }
        if self.execution.shell.trim().is_empty() {
            return Err(ConfigError::InvalidValue("shell", self.execution.shell.clone()));
        }
        if self.file_send.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("chunk_size", "0".into()));
        }
        if self.reply.max_reply_chars == 0 {
            return Err(ConfigError::InvalidValue("max_reply_chars", "0".into()));
        }
        Ok(())
    }

    /// Settings for the command executor.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            default_timeout: Duration::from_secs(self.execution.max_execution_time),
            enable_logging: self.execution.enable_logging,
            max_output_bytes: self.execution.max_output_bytes,
            output_mode: self.execution.output_mode,
            shell: PathBuf::from(&self.execution.shell),
            shell_arg: default_shell_arg().to_string(),
            working_dir: self.execution.working_directory.clone(),
        }
    }

    /// Settings for the file sender.
    pub fn file_sender_config(&self) -> FileSenderConfig {
        FileSenderConfig {
            base_directory: self.file_send.base_directory.clone(),
            chunk_size: self.file_send.chunk_size,
        }
    }

    /// Settings for reply rendering.
    pub fn reply_config(&self) -> ReplyConfig {
        ReplyConfig {
            max_reply_chars: self.reply.max_reply_chars,
        }
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A setting has an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(field, value) => {
                write!(f, "invalid value for {}: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
