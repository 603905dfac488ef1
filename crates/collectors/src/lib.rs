//! Collector adapters for jscol.
//!
//! Each supported tool is driven through the [`Collector`] trait. Tools that
//! take their targets as arguments are read through a [`StreamingCollector`];
//! tools fed through stdin use a [`FileInputCollector`]. [`collector_for`]
//! picks the right one from a [`ToolSpec`](jscol_core::ToolSpec).

mod collector;
mod file_input;
mod filter;
mod streaming;

pub use collector::{CollectRequest, Collector, TARGETS_PLACEHOLDER, collector_for};
pub use file_input::FileInputCollector;
pub use filter::LineFilter;
pub use streaming::StreamingCollector;
