//! Reconstruction of one build from its event stream.
//!
//! [`LogBuilder`] correlates interleaved start/finish events into in-flight
//! records; the assembler freezes those records into the immutable
//! [`buildtrace_types::Build`] tree when the stream ends.

mod assembler;
mod correlator;
mod records;

pub use correlator::LogBuilder;
