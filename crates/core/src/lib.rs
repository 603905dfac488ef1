//! Core types and utilities for jscol.
//!
//! Everything the provisioning and collection crates share lives here: the
//! error taxonomy, the host [`Platform`], validated [`ToolSpec`] values built
//! from the [`Config`] file, and the per-run [`AggregateReport`].

pub mod config;
mod error;
pub mod platform;
pub mod report;
pub mod spec;

pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use platform::{Os, Platform};
pub use report::{AggregateReport, CollectionResult};
pub use spec::{AcquisitionStrategy, InputMode, SourceOverride, ToolName, ToolSpec};
