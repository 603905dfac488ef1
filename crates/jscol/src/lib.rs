//! jscol: run several JavaScript URL discovery tools against one target list.
//!
//! The binary loads a [`Config`], makes sure every configured tool is
//! installed, runs the tools in parallel through an [`Orchestrator`] and
//! prints a per-tool summary.

pub mod cli;
pub mod orchestrator;
pub mod tracing;

use ::tracing::info;
use jscol_collectors::CollectRequest;
use jscol_core::{AggregateReport, Config, Platform};
use jscol_tools::{Provisioner, RemoteFetcher, SourceBuilder};
use std::sync::Arc;

pub use cli::{Cli, CliError};
pub use orchestrator::{COMPLETION_MARKER, Orchestrator, RunPhase, render_summary};

/// Execute one run as described by `cli`.
///
/// # Errors
///
/// Returns a [`CliError`] for configuration, provisioning and I/O failures.
/// Collector failures are not errors; they are reported in the returned
/// [`AggregateReport`].
pub async fn run(cli: &Cli) -> Result<AggregateReport, CliError> {
    if !cli.urlfile.is_file() {
        return Err(CliError::config_with_help(
            format!("target file {} does not exist", cli.urlfile.display()),
            "Pass --urlfile with a file listing one URL per line",
        ));
    }

    let mut config = Config::load(&cli.config)?;
    if let Some(dir) = &cli.results_dir {
        config = config.with_results_dir(dir.clone());
    }
    let specs = config.tool_specs()?;
    info!(
        config = %cli.config.display(),
        tools = specs.len(),
        results_dir = %config.results_dir.display(),
        "Configuration loaded"
    );

    let platform = Platform::current();
    let request = CollectRequest {
        targets: cli.urlfile.clone(),
        results_dir: config.results_dir.clone(),
    };
    let orchestrator = Orchestrator::new(specs, request, config.timeouts.collector())
        .with_platform(platform);

    let report = if cli.skip_provision {
        orchestrator.run(None).await?
    } else {
        let builder = SourceBuilder::new(&config.build.git, &config.build.go);
        let fetcher = RemoteFetcher::new(config.timeouts.fetch(), builder)?;
        let provisioner = Provisioner::new(Arc::new(fetcher), platform);
        orchestrator.run(Some(&provisioner)).await?
    };

    if let Some(path) = &cli.report {
        write_report(&report, path).await?;
    }
    Ok(report)
}

async fn write_report(report: &AggregateReport, path: &std::path::Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::other(format!("Failed to serialize report: {e}")))?;
    tokio::fs::write(path, json).await.map_err(|e| {
        CliError::other_with_help(
            format!("Failed to write report {}: {e}", path.display()),
            "Check that the report directory exists and is writable",
        )
    })?;
    info!(path = %path.display(), "Report written");
    Ok(())
}
