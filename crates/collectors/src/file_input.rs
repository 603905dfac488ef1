//! Collector for tools that read their targets from stdin.

use async_trait::async_trait;
use jscol_core::{Error, Result, ToolName};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::collector::{CollectRequest, Collector, Invocation};
use crate::filter::LineFilter;
use crate::streaming::{OUTPUT_TAIL, check_status, last_lines};

/// Connects the target file to the tool's stdin and captures all output.
///
/// The raw output (stdout followed by stderr) of a successful run is
/// appended to `<results_dir>/<tool>.txt`; every non-blank line is a result.
pub struct FileInputCollector {
    invocation: Invocation,
}

impl FileInputCollector {
    pub(crate) const fn new(invocation: Invocation) -> Self {
        Self { invocation }
    }
}

#[async_trait]
impl Collector for FileInputCollector {
    fn name(&self) -> ToolName {
        self.invocation.tool
    }

    async fn collect(&self, request: &CollectRequest) -> Result<Vec<String>> {
        let tool = self.invocation.tool;
        let program = &self.invocation.program;

        let targets = std::fs::File::open(&request.targets).map_err(|e| {
            Error::collection(
                tool.as_str(),
                format!("failed to open {}: {e}", request.targets.display()),
            )
        })?;

        let args = self.invocation.args_for(&request.targets);
        debug!(program = %program.display(), ?args, "Launching stdin-fed collector");

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::from(targets))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::collection(
                    tool.as_str(),
                    format!("failed to launch {}: {e}", program.display()),
                )
            })?;

        // Dropping the pending future on timeout kills the child.
        let output = tokio::time::timeout(self.invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("Collector timed out, killing it");
                Error::Timeout {
                    seconds: self.invocation.timeout.as_secs(),
                }
            })?
            .map_err(|e| Error::collection(tool.as_str(), format!("waiting for exit: {e}")))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        let text = String::from_utf8_lossy(&combined);

        if !output.status.success() {
            let lines = last_lines(&text, OUTPUT_TAIL);
            check_status(tool, output.status, &lines)?;
        }

        let results_file = request.results_dir.join(format!("{tool}.txt"));
        append_output(&results_file, &combined).await?;

        let urls = LineFilter::NonBlank.select_all(&text);
        debug!(count = urls.len(), file = %results_file.display(), "Collector output saved");
        Ok(urls)
    }
}

async fn append_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| Error::io(e, path, "open results file"))?;
    file.write_all(bytes)
        .await
        .map_err(|e| Error::io(e, path, "append results file"))?;
    file.flush()
        .await
        .map_err(|e| Error::io(e, path, "append results file"))
}
