//! Network side of provisioning.

use async_trait::async_trait;
use jscol_core::{Error, Result};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::build::SourceBuilder;

/// Retrieves tool artifacts from the outside world.
///
/// The provisioner only talks to this trait, so acquisition logic can be
/// exercised without network access or a Go toolchain.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` into the file at `dest`, replacing it if present.
    async fn fetch_file(&self, url: &str, dest: &Path) -> Result<()>;

    /// Clone the repository at `url` into `checkout` and build
    /// `binary_name` from it, returning the path of the compiled binary.
    async fn fetch_source(&self, url: &str, checkout: &Path, binary_name: &str)
    -> Result<PathBuf>;
}

/// Fetcher backed by HTTP downloads and local `git`/`go` programs.
pub struct RemoteFetcher {
    client: Client,
    builder: SourceBuilder,
}

impl RemoteFetcher {
    /// Create a fetcher whose HTTP requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(timeout: Duration, builder: SourceBuilder) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jscol/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, builder })
    }
}

#[async_trait]
impl Fetcher for RemoteFetcher {
    async fn fetch_file(&self, url: &str, dest: &Path) -> Result<()> {
        info!(%url, dest = %dest.display(), "Downloading");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::download(url, format!("HTTP {status}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::io(e, dest, "create download file"))?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::download(url, format!("Failed to read body: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(e, dest, "write download file"))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::io(e, dest, "write download file"))?;

        debug!(%url, bytes = written, "Download finished");
        Ok(())
    }

    async fn fetch_source(
        &self,
        url: &str,
        checkout: &Path,
        binary_name: &str,
    ) -> Result<PathBuf> {
        self.builder.build(url, checkout, binary_name).await
    }
}
