//! Execution request representation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A shell command line to run once.
///
/// Built with consuming setters and read through accessors, so a request
/// cannot change after it has been handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    command: String,
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl ExecutionRequest {
    /// Create a request for the given command line.
    ///
    /// The command line is passed verbatim to the shell, so pipes,
    /// redirection and chaining behave exactly as in an interactive shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            working_dir: None,
            env: HashMap::new(),
        }
    }

    /// Set the execution timeout.
    ///
    /// A zero duration is ignored and the executor default applies.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = (!duration.is_zero()).then_some(duration);
        self
    }

    /// Set the timeout in whole seconds.
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Timeout to apply, falling back to `default`.
    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new() {
        let req = ExecutionRequest::new("ls -la | wc -l");
        assert_eq!(req.command(), "ls -la | wc -l");
        assert!(req.working_directory().is_none());
        assert!(req.env_vars().is_empty());
        assert!(req.timeout_override().is_none());
    }

    #[test]
    fn test_request_builder_chain() {
        let req = ExecutionRequest::new("make")
            .working_dir("/project")
            .env("RUST_LOG", "debug")
            .timeout(Duration::from_secs(60));

        assert_eq!(req.working_directory(), Some(Path::new("/project")));
        assert_eq!(req.env_vars().get("RUST_LOG"), Some(&"debug".to_string()));
        assert_eq!(req.timeout_override(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_request_envs() {
        let req = ExecutionRequest::new("env").envs([("KEY1", "val1"), ("KEY2", "val2")]);
        assert_eq!(req.env_vars().len(), 2);
        assert_eq!(req.env_vars().get("KEY2"), Some(&"val2".to_string()));
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let req = ExecutionRequest::new("true").timeout_secs(0);
        assert!(req.timeout_override().is_none());
        assert_eq!(
            req.effective_timeout(Duration::from_secs(30)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_effective_timeout_override() {
        let req = ExecutionRequest::new("true").timeout_secs(5);
        assert_eq!(
            req.effective_timeout(Duration::from_secs(30)),
            Duration::from_secs(5)
        );
    }
}
