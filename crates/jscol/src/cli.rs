use clap::Parser;
use jscol_core::ErrorCategory;
use jscol_core::config::DEFAULT_CONFIG_FILE;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::tracing::{LogLevel, TracingFormat};

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Runtime bootstrap or unexpected failure
pub const EXIT_RUNTIME: i32 = 1;
/// Configuration error exit code
pub const EXIT_CONFIG: i32 = 2;
/// Tool provisioning failure exit code
pub const EXIT_PROVISION: i32 = 3;
/// At least one collector failed
pub const EXIT_PARTIAL: i32 = 4;

/// Run JavaScript URL discovery tools against a list of targets.
#[derive(Parser, Debug, Clone)]
#[command(name = "jscol", version, about, long_about = None)]
pub struct Cli {
    /// File listing the target URLs, one per line
    #[arg(long, value_name = "FILE")]
    pub urlfile: PathBuf,

    /// Path to the configuration file
    #[arg(long, short = 'c', value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory for per-tool result files (overrides the config)
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Write the full report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Assume every tool is already installed
    #[arg(long)]
    pub skip_provision: bool,

    /// Log level
    #[arg(long, short = 'L', value_enum, default_value_t = LogLevel::Info, env = "JSCOL_LOG_LEVEL")]
    pub level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,
}

/// Parse command line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Configuration error (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(jscol::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },
    /// Tool provisioning error (exit code 3)
    #[error("Provisioning error: {message}")]
    #[diagnostic(code(jscol::provision))]
    Provision {
        message: String,
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 1)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(jscol::other))]
    Other {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `jscol_core::Error` to the matching `CliError` variant.
impl From<jscol_core::Error> for CliError {
    fn from(err: jscol_core::Error) -> Self {
        match err {
            // Keep just the message to avoid "Configuration error: Configuration error:"
            jscol_core::Error::Configuration { message, help } => Self::Config { message, help },
            jscol_core::Error::Io {
                source,
                path,
                operation,
            } => {
                let path_str = path
                    .as_ref()
                    .map_or(String::new(), |p| format!(" on {}", p.display()));
                Self::other_with_help(
                    format!("I/O {operation} failed{path_str}: {source}"),
                    "Check file permissions and ensure the path exists",
                )
            }
            other => match other.category() {
                ErrorCategory::Provisioning => Self::Provision {
                    message: other.to_string(),
                    help: Some(
                        "Install the tool manually at the configured path, or check network access and the git/go toolchain"
                            .to_string(),
                    ),
                },
                ErrorCategory::Configuration | ErrorCategory::Collection => {
                    Self::other(other.to_string())
                }
            },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CONFIG,
        CliError::Provision { .. } => EXIT_PROVISION,
        CliError::Other { .. } => EXIT_RUNTIME,
    }
}
