//! The collector capability and how collectors are chosen for a tool.

use async_trait::async_trait;
use jscol_core::{InputMode, Platform, Result, ToolName, ToolSpec};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::file_input::FileInputCollector;
use crate::filter::LineFilter;
use crate::streaming::StreamingCollector;

/// Placeholder in configured arguments replaced by the target-file path.
pub const TARGETS_PLACEHOLDER: &str = "{targets}";

/// Inputs shared by every collector of one run.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    /// File listing the URLs to crawl.
    pub targets: PathBuf,
    /// Directory receiving per-tool output files.
    pub results_dir: PathBuf,
}

/// Runs one external tool and reports the JS URLs it found.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> ToolName;

    /// Run the tool against `request`.
    ///
    /// Any failure discards partial output.
    async fn collect(&self, request: &CollectRequest) -> Result<Vec<String>>;
}

/// How to launch a tool process.
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub tool: ToolName,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    /// Arguments with the targets placeholder expanded.
    pub fn args_for(&self, targets: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg.contains(TARGETS_PLACEHOLDER) {
                    OsString::from(arg.replace(TARGETS_PLACEHOLDER, &targets.to_string_lossy()))
                } else {
                    OsString::from(arg)
                }
            })
            .collect()
    }
}

/// Build the collector for `spec`.
///
/// Tools fed through stdin get a [`FileInputCollector`]; everything else
/// streams stdout through the tool's [`LineFilter`].
#[must_use]
pub fn collector_for(spec: &ToolSpec, platform: Platform, timeout: Duration) -> Arc<dyn Collector> {
    let invocation = Invocation {
        tool: spec.name(),
        program: platform.executable_path(spec.path()),
        args: spec.args().to_vec(),
        timeout,
    };
    match spec.input() {
        InputMode::Stdin => Arc::new(FileInputCollector::new(invocation)),
        InputMode::Arguments => Arc::new(StreamingCollector::new(
            invocation,
            LineFilter::for_tool(spec.name()),
        )),
    }
}
