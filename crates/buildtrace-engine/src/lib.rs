// Engine crate - build log reconstruction (correlation, text mining, export)
// This layer sits between raw build events (types) and consumers of the
// frozen model

pub mod build;
pub mod error;
pub mod export;
pub mod text;

pub use build::LogBuilder;
pub use error::{Error, Result};
pub use export::{export_raw_json, export_text, write_raw_json, write_text};

use buildtrace_types::{Build, BuildEvent, ReplaySource};

// Façade API - stable entry points for consumers that hold a complete
// event stream and want the frozen model in one call

/// Reconstruct a frozen build model from a complete event slice.
pub fn build_log(events: &[BuildEvent]) -> Result<Build> {
    let builder = LogBuilder::new();
    builder.process(ReplaySource::new(events.to_vec()))
}
