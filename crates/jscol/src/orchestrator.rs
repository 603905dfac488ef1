//! One collection run: provision every tool, fan out collectors, gather results.

use jscol_collectors::{CollectRequest, collector_for};
use jscol_core::{AggregateReport, CollectionResult, Error, Platform, Result, ToolName, ToolSpec};
use jscol_tools::Provisioner;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Marker printed once every collector has finished.
pub const COMPLETION_MARKER: &str = "collection complete";

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Provisioning tools.
    Initializing,
    /// Collectors are being launched.
    Running,
    /// Waiting for collectors to report.
    Collecting,
    /// Every result is in.
    Done,
}

/// Drives a single, one-shot collection run.
pub struct Orchestrator {
    specs: Vec<ToolSpec>,
    request: Arc<CollectRequest>,
    platform: Platform,
    collector_timeout: Duration,
    phase: RunPhase,
}

impl Orchestrator {
    #[must_use]
    pub fn new(specs: Vec<ToolSpec>, request: CollectRequest, collector_timeout: Duration) -> Self {
        Self {
            specs,
            request: Arc::new(request),
            platform: Platform::current(),
            collector_timeout,
            phase: RunPhase::Initializing,
        }
    }

    /// Use `platform` when resolving executable paths.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    fn transition(&mut self, phase: RunPhase) {
        info!(from = ?self.phase, to = ?phase, "Run phase changed");
        self.phase = phase;
    }

    /// Provision every tool, one after another.
    ///
    /// # Errors
    ///
    /// Any provisioning failure is returned and ends the run.
    pub async fn provision(&mut self, provisioner: &Provisioner) -> Result<()> {
        if self.phase != RunPhase::Initializing {
            return Err(Error::configuration("tools can only be provisioned before collection"));
        }
        info!(tools = self.specs.len(), platform = %provisioner.platform(), "Provisioning tools");
        provisioner.ensure_all(&self.specs).await?;
        Ok(())
    }

    /// Run every collector concurrently and wait for all of them.
    ///
    /// Individual collector failures are recorded in the report; they never
    /// abort the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run was already collected or the results
    /// directory cannot be created.
    pub async fn collect(&mut self) -> Result<AggregateReport> {
        if self.phase != RunPhase::Initializing {
            return Err(Error::configuration("a run can only be collected once"));
        }

        let results_dir = &self.request.results_dir;
        tokio::fs::create_dir_all(results_dir)
            .await
            .map_err(|e| Error::io(e, results_dir, "create results directory"))?;

        self.transition(RunPhase::Running);
        let mut tasks = JoinSet::new();
        let mut launched = HashMap::new();
        for spec in &self.specs {
            let tool = spec.name();
            let collector = collector_for(spec, self.platform, self.collector_timeout);
            let request = Arc::clone(&self.request);
            let span = info_span!("collector", tool = %tool);

            let handle = tasks.spawn(
                async move {
                    info!("Collector started");
                    let started = Instant::now();
                    let outcome = collector.collect(&request).await;
                    let elapsed = elapsed_ms(started);
                    match outcome {
                        Ok(urls) => {
                            info!(urls = urls.len(), elapsed_ms = elapsed, "Collector finished");
                            CollectionResult::succeeded(tool, urls, elapsed)
                        }
                        Err(e) => {
                            warn!(error = %e, elapsed_ms = elapsed, "Collector failed");
                            CollectionResult::failed(tool, e.to_string(), elapsed)
                        }
                    }
                }
                .instrument(span),
            );
            launched.insert(handle.id(), tool);
        }

        self.transition(RunPhase::Collecting);
        let mut report = AggregateReport::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, result)) => report.push(result),
                Err(join_error) => {
                    let Some(tool) = launched.get(&join_error.id()).copied() else {
                        error!(error = %join_error, "Unknown collector task failed");
                        continue;
                    };
                    error!(%tool, error = %join_error, "Collector task aborted");
                    report.push(CollectionResult::failed(
                        tool,
                        format!("collector task aborted: {join_error}"),
                        0,
                    ));
                }
            }
        }

        debug!(
            results = report.len(),
            launched = launched.len(),
            "All results received"
        );
        self.transition(RunPhase::Done);
        info!(
            failures = report.failures().count(),
            "All tools finished"
        );
        Ok(report)
    }

    /// Provision (unless `provisioner` is `None`) and collect.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::provision`] and [`Orchestrator::collect`].
    pub async fn run(mut self, provisioner: Option<&Provisioner>) -> Result<AggregateReport> {
        if let Some(provisioner) = provisioner {
            self.provision(provisioner).await?;
        } else {
            debug!("Provisioning skipped");
        }
        self.collect().await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Human-readable run summary ending with [`COMPLETION_MARKER`].
#[must_use]
pub fn render_summary(report: &AggregateReport) -> String {
    let mut out = String::new();
    for tool in ToolName::ALL {
        let Some(result) = report.get(tool) else {
            continue;
        };
        match &result.error {
            None => {
                let _ = writeln!(out, "{tool}: {} urls", result.urls.len());
            }
            Some(error) => {
                let _ = writeln!(out, "{tool}: error: {error}");
            }
        }
    }
    let _ = writeln!(out, "unique urls: {}", report.unique_urls().len());
    out.push_str(COMPLETION_MARKER);
    out
}
