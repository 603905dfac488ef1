//! Tool identity as loaded from configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// The fixed set of external collectors jscol knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolName {
    #[serde(rename = "jsfinder")]
    JsFinder,
    #[serde(rename = "URLFinder")]
    UrlFinder,
    #[serde(rename = "getJS")]
    GetJs,
    #[serde(rename = "subjs")]
    SubJs,
}

impl ToolName {
    /// Every supported tool, in launch order.
    pub const ALL: [Self; 4] = [Self::JsFinder, Self::UrlFinder, Self::GetJs, Self::SubJs];

    /// Stable identifier, also used as the executable name inside archives
    /// and as the stem of per-tool result files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JsFinder => "jsfinder",
            Self::UrlFinder => "URLFinder",
            Self::GetJs => "getJS",
            Self::SubJs => "subjs",
        }
    }

    /// How the tool receives its targets unless configuration says otherwise.
    #[must_use]
    pub const fn default_input(self) -> InputMode {
        match self {
            Self::SubJs => InputMode::Stdin,
            Self::JsFinder | Self::UrlFinder | Self::GetJs => InputMode::Arguments,
        }
    }

    /// Parse a tool name, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a collector hands the target list to its tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Targets travel through the configured argument list.
    #[serde(alias = "args")]
    Arguments,
    /// The target file is connected to the tool's standard input.
    Stdin,
}

/// Method used to materialize a missing executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionStrategy {
    /// Download the executable itself.
    Direct,
    /// Download an archive and pull the executable out of it.
    Archive,
    /// Clone the source and build it locally.
    Build,
}

impl std::fmt::Display for AcquisitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct-download"),
            Self::Archive => write!(f, "archive-download"),
            Self::Build => write!(f, "source-build"),
        }
    }
}

/// Configured replacement for the built-in acquisition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOverride {
    pub strategy: AcquisitionStrategy,
    pub url: String,
}

/// A validated external tool definition.
///
/// Built once from configuration and shared read-only with the provisioner
/// and the collector for that tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    name: ToolName,
    path: PathBuf,
    args: Vec<String>,
    input: InputMode,
    source: Option<SourceOverride>,
}

impl ToolSpec {
    /// Create a tool spec, rejecting an empty executable path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `path` is empty.
    pub fn new(name: ToolName, path: impl Into<PathBuf>, args: Vec<String>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::configuration_with_help(
                format!("tool '{name}' has an empty path"),
                "Set \"path\" to where the executable should live, e.g. \"tools/getJS\"",
            ));
        }
        Ok(Self {
            name,
            path,
            args,
            input: name.default_input(),
            source: None,
        })
    }

    /// Override how the tool receives its targets.
    #[must_use]
    pub fn with_input(mut self, input: InputMode) -> Self {
        self.input = input;
        self
    }

    /// Replace the built-in acquisition source.
    #[must_use]
    pub fn with_source(mut self, source: Option<SourceOverride>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub const fn name(&self) -> ToolName {
        self.name
    }

    /// Configured executable path, without any platform suffix.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub const fn input(&self) -> InputMode {
        self.input
    }

    #[must_use]
    pub const fn source(&self) -> Option<&SourceOverride> {
        self.source.as_ref()
    }
}
