//! Configuration file loading.
//!
//! The configuration is a single JSON document with one entry per tool plus a
//! few run-wide settings:
//!
//! ```json
//! {
//!   "results_dir": "results",
//!   "urlfinder": { "path": "tools/URLFinder", "args": ["-f", "{targets}"] },
//!   "subjs": { "path": "tools/subjs", "args": [] },
//!   "timeouts": { "collector_secs": 600, "fetch_secs": 300 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::spec::{InputMode, SourceOverride, ToolName, ToolSpec};
use crate::{Error, Result};

/// Default name of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default directory for per-tool result files.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// One tool entry as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(alias = "Path")]
    pub path: String,
    #[serde(default, alias = "Args")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceOverride>,
}

/// Deadlines applied to external work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Upper bound for a single collector process.
    pub collector_secs: u64,
    /// Upper bound for a single HTTP download.
    pub fetch_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            collector_secs: 600,
            fetch_secs: 300,
        }
    }
}

impl Timeouts {
    #[must_use]
    pub const fn collector(&self) -> Duration {
        Duration::from_secs(self.collector_secs)
    }

    #[must_use]
    pub const fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }
}

/// Programs used for source builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub git: String,
    pub go: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            go: "go".to_string(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsfinder: Option<ToolConfig>,
    #[serde(
        default,
        alias = "URLFinder",
        alias = "urlFinder",
        skip_serializing_if = "Option::is_none"
    )]
    pub urlfinder: Option<ToolConfig>,
    #[serde(default, alias = "getJS", skip_serializing_if = "Option::is_none")]
    pub getjs: Option<ToolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjs: Option<ToolConfig>,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub build: BuildConfig,
    /// Keys jscol does not use, kept so they can be reported.
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            jsfinder: None,
            urlfinder: None,
            getjs: None,
            subjs: None,
            timeouts: Timeouts::default(),
            build: BuildConfig::default(),
            unknown: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_help(
                format!("Failed to open config file {}: {e}", path.display()),
                "Pass --config with the path to your config.json",
            )
        })?;
        Self::from_json(&contents)
    }

    /// Parse configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the key path that failed to parse.
    pub fn from_json(contents: &str) -> Result<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(contents);
        let config: Self = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            let path = e.path().to_string();
            Error::configuration(format!("Failed to parse config at '{path}': {}", e.inner()))
        })?;

        for key in config.unknown.keys() {
            warn!(%key, "Ignoring unknown configuration key");
        }
        Ok(config)
    }

    /// Override the results directory (e.g. from the command line).
    #[must_use]
    pub fn with_results_dir(mut self, dir: PathBuf) -> Self {
        self.results_dir = dir;
        self
    }

    fn tool_config(&self, name: ToolName) -> Option<&ToolConfig> {
        match name {
            ToolName::JsFinder => self.jsfinder.as_ref(),
            ToolName::UrlFinder => self.urlfinder.as_ref(),
            ToolName::GetJs => self.getjs.as_ref(),
            ToolName::SubJs => self.subjs.as_ref(),
        }
    }

    /// Validated tool specs for every configured tool, in launch order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a tool entry is invalid or if no tool
    /// is configured at all.
    pub fn tool_specs(&self) -> Result<Vec<ToolSpec>> {
        let mut specs = Vec::new();
        for name in ToolName::ALL {
            let Some(tool) = self.tool_config(name) else {
                debug!(tool = %name, "Tool not configured, skipping");
                continue;
            };
            let spec = ToolSpec::new(name, &tool.path, tool.args.clone())?
                .with_input(tool.input.unwrap_or_else(|| name.default_input()))
                .with_source(tool.source.clone());
            specs.push(spec);
        }

        if specs.is_empty() {
            return Err(Error::configuration_with_help(
                "no tools configured",
                "Add at least one of jsfinder, urlfinder, getjs or subjs to the config",
            ));
        }
        Ok(specs)
    }
}
