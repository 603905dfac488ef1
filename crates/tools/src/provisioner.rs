//! Making sure every configured tool exists on disk.

use jscol_core::{AcquisitionStrategy, Error, ErrorCategory, Platform, Result, ToolSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, instrument};

use crate::extract::{extract_archive, find_executable};
use crate::fetch::Fetcher;
use crate::plan::AcquisitionPlan;

/// What [`Provisioner::ensure`] had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The executable was already in place; nothing was fetched.
    AlreadyPresent(PathBuf),
    /// The executable was acquired with the given strategy.
    Acquired {
        path: PathBuf,
        strategy: AcquisitionStrategy,
    },
}

impl ProvisionOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyPresent(path) | Self::Acquired { path, .. } => path,
        }
    }
}

/// Acquires missing tool executables for one platform.
pub struct Provisioner {
    fetcher: Arc<dyn Fetcher>,
    platform: Platform,
}

impl Provisioner {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, platform: Platform) -> Self {
        Self { fetcher, platform }
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Ensure the executable for `spec` exists, acquiring it if needed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the tool cannot be obtained for this
    /// platform, and a provisioning error if acquisition fails.
    #[instrument(skip_all, fields(tool = %spec.name()))]
    pub async fn ensure(&self, spec: &ToolSpec) -> Result<ProvisionOutcome> {
        let plan = AcquisitionPlan::resolve(spec, self.platform)?;
        let target = self.platform.executable_path(spec.path());

        if target.exists() {
            debug!(path = %target.display(), "Executable already present");
            return Ok(ProvisionOutcome::AlreadyPresent(target));
        }

        // Archives and builds name the binary after the tool, not the configured path.
        let executable = format!("{}{}", spec.name().as_str(), self.platform.executable_suffix());
        info!(strategy = %plan.strategy, url = %plan.url, "Provisioning tool");
        self.acquire(&plan, &executable, &target).await.map_err(|e| {
            if e.category() == ErrorCategory::Configuration {
                e
            } else {
                Error::provisioning(spec.name().as_str(), e.to_string())
            }
        })?;

        info!(path = %target.display(), "Tool ready");
        Ok(ProvisionOutcome::Acquired {
            path: target,
            strategy: plan.strategy,
        })
    }

    /// Ensure every tool in turn, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`Provisioner::ensure`].
    pub async fn ensure_all(&self, specs: &[ToolSpec]) -> Result<Vec<ProvisionOutcome>> {
        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            outcomes.push(self.ensure(spec).await?);
        }
        Ok(outcomes)
    }

    async fn acquire(&self, plan: &AcquisitionPlan, executable: &str, target: &Path) -> Result<()> {
        let tools_dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&tools_dir)
            .await
            .map_err(|e| Error::io(e, &tools_dir, "create tools directory"))?;

        // Scratch lives next to the target so the final rename stays on one filesystem.
        let scratch = tempfile::Builder::new()
            .prefix(".jscol-")
            .tempdir_in(&tools_dir)
            .map_err(|e| Error::io(e, &tools_dir, "create scratch directory"))?;

        match plan.strategy {
            AcquisitionStrategy::Direct => {
                let staged = scratch.path().join(executable);
                self.fetcher.fetch_file(&plan.url, &staged).await?;
                move_into_place(&staged, target).await?;
            }
            AcquisitionStrategy::Archive => {
                let staged = self.unpack(plan, &scratch, executable).await?;
                move_into_place(&staged, target).await?;
            }
            AcquisitionStrategy::Build => {
                let checkout = scratch.path().join("src");
                let built = self
                    .fetcher
                    .fetch_source(&plan.url, &checkout, executable)
                    .await?;
                move_into_place(&built, target).await?;
            }
        }

        if self.platform.needs_exec_bit() {
            make_executable(target)?;
        }
        Ok(())
    }

    async fn unpack(
        &self,
        plan: &AcquisitionPlan,
        scratch: &TempDir,
        executable: &str,
    ) -> Result<PathBuf> {
        let archive = scratch.path().join(plan.file_name());
        self.fetcher.fetch_file(&plan.url, &archive).await?;

        let extracted = scratch.path().join("extracted");
        let dest = extracted.clone();
        let needle = executable.to_string();
        let found = tokio::task::spawn_blocking(move || {
            extract_archive(&archive, &dest)?;
            find_executable(&dest, &needle)
        })
        .await
        .map_err(|e| Error::extraction(&extracted, format!("extraction task failed: {e}")))??;

        found.ok_or_else(|| {
            Error::extraction(
                &extracted,
                format!("no file matching '{executable}' in archive"),
            )
        })
    }
}

/// Move `from` to `to`, copying when a rename is not possible.
async fn move_into_place(from: &Path, to: &Path) -> Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    debug!(from = %from.display(), to = %to.display(), "Rename failed, copying instead");
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| Error::io(e, to, "install executable"))?;
    tokio::fs::remove_file(from)
        .await
        .map_err(|e| Error::io(e, from, "remove staged executable"))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::io(e, path, "set executable permissions"))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
