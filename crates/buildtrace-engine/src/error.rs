use std::fmt;

/// Result type for buildtrace-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconstructing a build log.
///
/// Only `AlreadyFinished` ever reaches callers of the event-handling entry
/// points; every other per-event failure is converted into a synthetic
/// error-severity diagnostic and the stream keeps going.
#[derive(Debug)]
pub enum Error {
    /// The builder's single-use contract was violated: an event arrived or
    /// `finish` was called after the builder was already finished.
    AlreadyFinished,

    /// The event stream contradicted itself (duplicate open id, finish
    /// without a matching start, missing enclosing scope).
    Consistency(String),

    /// A message matched a recognized structured prefix but its payload did
    /// not follow the expected grammar.
    MalformedMessage(String),

    /// The finished record set could not be assembled into a tree.
    Assembly(String),

    /// The event source failed while producing events.
    Event(buildtrace_types::Error),

    /// JSON serialization failed (raw exporter).
    Json(serde_json::Error),

    /// IO failed while writing exporter output.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyFinished => {
                write!(f, "Build log builder has already finished; no further events or finish calls are allowed")
            }
            Error::Consistency(msg) => write!(f, "Event stream consistency error: {}", msg),
            Error::MalformedMessage(msg) => write!(f, "Malformed structured message: {}", msg),
            Error::Assembly(msg) => write!(f, "Model assembly error: {}", msg),
            Error::Event(err) => write!(f, "Event source error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Event(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::AlreadyFinished
            | Error::Consistency(_)
            | Error::MalformedMessage(_)
            | Error::Assembly(_) => None,
        }
    }
}

impl From<buildtrace_types::Error> for Error {
    fn from(err: buildtrace_types::Error) -> Self {
        Error::Event(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
