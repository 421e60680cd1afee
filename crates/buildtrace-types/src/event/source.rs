use std::collections::VecDeque;
use std::io::BufRead;

use crate::error::Result;
use crate::event::BuildEvent;

/// Pull-based stream of typed build events.
///
/// This is the seam between the reconstruction engine and whatever produces
/// events: a live engine hookup or a saved-log reader. Both deliver the same
/// typed events in the same order, so consumers never know the difference.
pub trait EventSource {
    /// Next event in delivery order, or `None` when the stream is exhausted.
    fn next_event(&mut self) -> Result<Option<BuildEvent>>;
}

/// In-memory event source over an already-collected sequence.
pub struct ReplaySource {
    events: VecDeque<BuildEvent>,
}

impl ReplaySource {
    pub fn new(events: Vec<BuildEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl EventSource for ReplaySource {
    fn next_event(&mut self) -> Result<Option<BuildEvent>> {
        Ok(self.events.pop_front())
    }
}

impl From<Vec<BuildEvent>> for ReplaySource {
    fn from(events: Vec<BuildEvent>) -> Self {
        Self::new(events)
    }
}

/// Event source reading one JSON event per line.
///
/// The inverse of the raw JSON exporter; blank lines are skipped, malformed
/// lines are errors (a saved stream is expected to be machine-written).
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> Result<Option<BuildEvent>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line)?;
            if read == 0 {
                return Ok(None);
            }

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let event: BuildEvent = serde_json::from_str(trimmed)?;
            return Ok(Some(event));
        }
    }
}
