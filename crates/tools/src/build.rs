//! Source builds: `git clone` followed by `go build`.

use jscol_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

/// Programs used to clone and compile tool sources.
#[derive(Debug, Clone)]
pub struct SourceBuilder {
    git: String,
    go: String,
}

impl Default for SourceBuilder {
    fn default() -> Self {
        Self::new("git", "go")
    }
}

impl SourceBuilder {
    #[must_use]
    pub fn new(git: impl Into<String>, go: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            go: go.into(),
        }
    }

    /// Clone `url` into `checkout` and build `binary_name` next to it.
    ///
    /// The binary is written to the parent of `checkout`, so a scratch
    /// directory holding the checkout also holds the result.
    ///
    /// # Errors
    ///
    /// Returns a build error carrying the combined command output if either
    /// step fails, or if the compiled binary is missing afterwards.
    pub async fn build(&self, url: &str, checkout: &Path, binary_name: &str) -> Result<PathBuf> {
        let output_dir = checkout.parent().unwrap_or(checkout);
        let binary = output_dir.join(binary_name);

        info!(%url, checkout = %checkout.display(), "Cloning tool source");
        let clone = Command::new(&self.git)
            .arg("clone")
            .arg(url)
            .arg(checkout)
            .output()
            .await
            .map_err(|e| Error::build("git clone", format!("Failed to run {}: {e}", self.git)))?;
        check("git clone", &clone)?;

        info!(binary = %binary.display(), "Compiling tool source");
        let compile = Command::new(&self.go)
            .arg("build")
            .arg("-o")
            .arg(&binary)
            .arg(".")
            .current_dir(checkout)
            .output()
            .await
            .map_err(|e| Error::build("go build", format!("Failed to run {}: {e}", self.go)))?;
        check("go build", &compile)?;

        if !binary.exists() {
            return Err(Error::build(
                "go build",
                format!("expected output {} was not produced", binary.display()),
            ));
        }
        debug!(binary = %binary.display(), "Source build finished");
        Ok(binary)
    }
}

fn check(step: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Err(Error::build(
        step,
        format!("{} ({})", combined.trim(), output.status),
    ))
}
