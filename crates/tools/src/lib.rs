//! Tool provisioning for jscol.
//!
//! This crate provides functionality to:
//! - Resolve where each collector executable comes from for the host platform
//! - Download release files and archives, or clone and build from source
//! - Extract archives safely and move the executable into place
//!
//! # Example
//!
//! ```ignore
//! use jscol_tools::{Provisioner, RemoteFetcher, SourceBuilder};
//!
//! let fetcher = RemoteFetcher::new(timeouts.fetch(), SourceBuilder::default())?;
//! let provisioner = Provisioner::new(Arc::new(fetcher), Platform::current());
//! provisioner.ensure_all(&specs).await?;
//! ```

mod build;
pub mod extract;
mod fetch;
mod plan;
mod provisioner;

pub use build::SourceBuilder;
pub use extract::{ArchiveKind, ExtractLimits, extract_archive, extract_archive_with_limits};
pub use fetch::{Fetcher, RemoteFetcher};
pub use plan::AcquisitionPlan;
pub use provisioner::{ProvisionOutcome, Provisioner};
