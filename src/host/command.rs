//! Chat trigger parsing.

/// Trigger word for running a command.
pub const SHELL_TRIGGER: &str = "shell";

/// Trigger word for sending a file.
pub const SEND_FILE_TRIGGER: &str = "send_file";

/// A recognized chat trigger with its raw argument.
///
/// The argument is everything after the first whitespace, trimmed. It may be
/// empty, in which case the host replies with usage help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `shell <command-line>`
    Shell(String),
    /// `send_file <path>`
    SendFile(String),
}

impl ChatCommand {
    /// Parse a chat message, with or without a leading `/`.
    ///
    /// Returns `None` for messages that are not one of the triggers.
    pub fn parse(message: &str) -> Option<Self> {
        let trimmed = message.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);

        let (head, rest) = match body.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (body, ""),
        };

        match head {
            SHELL_TRIGGER => Some(Self::Shell(rest.to_string())),
            SEND_FILE_TRIGGER => Some(Self::SendFile(rest.to_string())),
            _ => None,
        }
    }

    /// The raw argument.
    pub fn argument(&self) -> &str {
        match self {
            Self::Shell(arg) | Self::SendFile(arg) => arg,
        }
    }

    /// Usage line shown when the argument is missing.
    pub fn usage(&self) -> &'static str {
        match self {
            Self::Shell(_) => "Please provide a command to run. Usage: /shell <command>",
            Self::SendFile(_) => "Please provide a file path. Usage: /send_file <path>",
        }
    }
}
