//! Collectors that read their tool's stdout line by line.

use async_trait::async_trait;
use jscol_core::{Error, Result, ToolName};
use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::collector::{CollectRequest, Collector, Invocation};
use crate::filter::LineFilter;

/// Lines of tool output kept for error messages.
pub(crate) const OUTPUT_TAIL: usize = 20;

/// Consecutive stderr read failures tolerated before giving up on the pipe.
const MAX_READ_ERRORS: u32 = 3;

/// Streams a tool's stdout and keeps the lines its [`LineFilter`] selects.
pub struct StreamingCollector {
    invocation: Invocation,
    filter: LineFilter,
}

impl StreamingCollector {
    pub(crate) const fn new(invocation: Invocation, filter: LineFilter) -> Self {
        Self { invocation, filter }
    }
}

#[async_trait]
impl Collector for StreamingCollector {
    fn name(&self) -> ToolName {
        self.invocation.tool
    }

    async fn collect(&self, request: &CollectRequest) -> Result<Vec<String>> {
        let tool = self.invocation.tool;
        let program = &self.invocation.program;
        let args = self.invocation.args_for(&request.targets);
        debug!(program = %program.display(), ?args, "Launching collector");

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
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

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::collection(tool.as_str(), "stdout pipe not available"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::collection(tool.as_str(), "stderr pipe not available"))?;
        let stderr_task = tokio::spawn(tail_lines(stderr));

        let filter = self.filter;
        let run = async {
            let mut urls = Vec::new();
            let mut lines = BufReader::new(stdout).split(b'\n');
            while let Some(raw) = lines
                .next_segment()
                .await
                .map_err(|e| Error::collection(tool.as_str(), format!("reading output: {e}")))?
            {
                let line = String::from_utf8_lossy(&raw);
                if let Some(url) = filter.select(&line) {
                    urls.push(url.to_string());
                }
            }
            let status = child
                .wait()
                .await
                .map_err(|e| Error::collection(tool.as_str(), format!("waiting for exit: {e}")))?;
            Ok::<_, Error>((urls, status))
        };

        let outcome = tokio::time::timeout(self.invocation.timeout, run).await;
        let (urls, status) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!("Collector timed out, killing it");
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Kill after timeout failed");
                }
                stderr_task.abort();
                return Err(Error::Timeout {
                    seconds: self.invocation.timeout.as_secs(),
                });
            }
        };

        let stderr_tail = stderr_task.await.unwrap_or_default();
        check_status(tool, status, &stderr_tail)?;
        debug!(count = urls.len(), "Collector output parsed");
        Ok(urls)
    }
}

/// Fail with the stderr tail when the tool exited unsuccessfully.
pub(crate) fn check_status(tool: ToolName, status: ExitStatus, stderr: &[String]) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let mut message = format!("exited with {status}");
    if !stderr.is_empty() {
        message.push_str(": ");
        message.push_str(&stderr.join("\n"));
    }
    Err(Error::collection(tool.as_str(), message))
}

/// Drain `reader` to EOF, keeping the last [`OUTPUT_TAIL`] lines.
///
/// The pipe stays open until the tool closes it, whatever bytes it writes.
async fn tail_lines(reader: impl AsyncRead + Unpin) -> Vec<String> {
    let mut tail = VecDeque::with_capacity(OUTPUT_TAIL);
    let mut segments = BufReader::new(reader).split(b'\n');
    let mut read_errors = 0;
    loop {
        match segments.next_segment().await {
            Ok(Some(raw)) => {
                read_errors = 0;
                let line = String::from_utf8_lossy(&raw).trim_end().to_string();
                debug!(target: "jscol::tool_stderr", "{line}");
                if tail.len() == OUTPUT_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                read_errors += 1;
                debug!(error = %e, "Reading tool stderr failed");
                if read_errors >= MAX_READ_ERRORS {
                    break;
                }
            }
        }
    }
    tail.into()
}

/// Last `limit` lines of `text`.
pub(crate) fn last_lines(text: &str, limit: usize) -> Vec<String> {
    let mut tail: Vec<String> = text.lines().rev().take(limit).map(str::to_string).collect();
    tail.reverse();
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tail_survives_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe broken\nok line\r\nlast\n";
        let tail = tail_lines(input).await;
        assert_eq!(tail.len(), 3);
        assert!(tail[0].ends_with("broken"));
        assert_eq!(tail[1..], ["ok line", "last"]);
    }

    #[tokio::test]
    async fn test_tail_keeps_last_lines() {
        let input: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let tail = tail_lines(input.as_bytes()).await;
        assert_eq!(tail.len(), OUTPUT_TAIL);
        assert_eq!(tail.last().map(String::as_str), Some("line 99"));
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc\n", 2), ["b", "c"]);
        assert_eq!(last_lines("", 2), Vec::<String>::new());
    }
}
