//! Command-line interface for the console host.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Command timeout in seconds (overrides config file).
    pub timeout: Option<u64>,
    /// Directory `send_file` is confined to.
    pub base_dir: Option<PathBuf>,
    /// Directory attachments are written to.
    pub outbox: Option<PathBuf>,
    /// Capture stdout and stderr into one stream.
    pub combine_output: bool,
    /// Disable the per-command audit log.
    pub no_command_log: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("timeout", value.clone()))?;
                if secs == 0 {
                    return Err(ArgsError::InvalidValue("timeout", value));
                }
                result.timeout = Some(secs);
            }
            Short('d') | Long("base-dir") => {
                result.base_dir = Some(parser.value()?.parse()?);
            }
            Short('o') | Long("outbox") => {
                result.outbox = Some(parser.value()?.parse()?);
            }
            Long("combine-output") => {
                result.combine_output = true;
            }
            Long("no-command-log") => {
                result.no_command_log = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"shell-exec {version}
Run shell commands and hand back files for an operator console

USAGE:
    shell-exec [OPTIONS]

Reads one trigger per line from stdin:
    shell <command-line>    Run a command through the shell
    send_file <path>        Hand a file back

OPTIONS:
    -c, --config <FILE>     Path to configuration file (JSON)
    -t, --timeout <SECS>    Command timeout in seconds [default: 30]
    -d, --base-dir <DIR>    Confine send_file to this directory
    -o, --outbox <DIR>      Write sent files into this directory
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --combine-output    Capture stdout and stderr as one stream
        --no-command-log    Do not log executed commands
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SHELL_EXEC_MAX_EXECUTION_TIME   Command timeout (overrides config)
    SHELL_EXEC_ENABLE_LOGGING       Command audit log on/off (overrides config)
    SHELL_EXEC_BASE_DIR             send_file base directory (overrides config)
    SHELL_EXEC_LOG_LEVEL            Log level (overrides config)
    RUST_LOG                        Alternative log level setting

EXAMPLES:
    # Defaults (30s timeout, split output)
    shell-exec

    # Short timeout, files confined to /srv/share and copied to ./outbox
    shell-exec -t 5 -d /srv/share -o ./outbox

    # Start with config file
    shell-exec -c /etc/shell-exec/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("shell-exec {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
