//! Error types shared across the jscol workspace.

use std::path::Path;
use thiserror::Error;

/// Broad classes of failure, used to decide whether an error aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or unsupported configuration. Fatal before any collection starts.
    Configuration,
    /// A tool could not be made available on disk. Fatal for the run.
    Provisioning,
    /// A single collector failed. Recorded in its result, never fatal.
    Collection,
}

/// Main error type for jscol operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, malformed or unsupported configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong.
        message: String,
        /// Optional hint for the user.
        help: Option<String>,
    },

    /// A tool could not be provisioned.
    #[error("Failed to provision {tool}: {message}")]
    Provisioning {
        /// Tool name.
        tool: String,
        /// Underlying failure.
        message: String,
    },

    /// An HTTP download failed.
    #[error("Download of {url} failed: {message}")]
    Download {
        /// Requested URL.
        url: String,
        /// Failure description, including the HTTP status when there is one.
        message: String,
    },

    /// An archive could not be extracted.
    #[error("Failed to extract {}: {message}", archive.display())]
    Extraction {
        /// Archive being extracted.
        archive: Box<Path>,
        /// Failure description.
        message: String,
    },

    /// A clone or compile step of a source build failed.
    #[error("{step} failed: {message}")]
    Build {
        /// Step that failed (e.g. "git clone").
        step: String,
        /// Failure description with the captured command output.
        message: String,
    },

    /// A collector failed to produce output.
    #[error("Collector {tool} failed: {message}")]
    Collection {
        /// Tool name.
        tool: String,
        /// Failure description.
        message: String,
    },

    /// An operation exceeded its deadline.
    #[error("Timeout after {seconds} seconds")]
    Timeout {
        /// Deadline that was exceeded.
        seconds: u64,
    },

    /// Filesystem or process I/O failure.
    #[error("I/O error during {operation}: {source}")]
    Io {
        /// Underlying error.
        #[source]
        source: std::io::Error,
        /// Path involved, if any.
        path: Option<Box<Path>>,
        /// What was being attempted.
        operation: String,
    },
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with a hint.
    #[must_use]
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a provisioning error.
    #[must_use]
    pub fn provisioning(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provisioning {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an extraction error.
    #[must_use]
    pub fn extraction(archive: &Path, message: impl Into<String>) -> Self {
        Self::Extraction {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create a build error.
    #[must_use]
    pub fn build(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Build {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Create a collection error.
    #[must_use]
    pub fn collection(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collection {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(source: std::io::Error, path: &Path, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Provisioning { .. }
            | Self::Download { .. }
            | Self::Extraction { .. }
            | Self::Build { .. } => ErrorCategory::Provisioning,
            Self::Collection { .. } | Self::Timeout { .. } | Self::Io { .. } => {
                ErrorCategory::Collection
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "io".to_string(),
        }
    }
}

/// Result type alias for jscol operations.
pub type Result<T> = std::result::Result<T, Error>;
