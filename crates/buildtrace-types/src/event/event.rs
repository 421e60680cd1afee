use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::BuildEventContext;
use super::payload::BuildEventPayload;

// NOTE: Schema Design Goals
//
// 1. Correlation: every event carries the engine-assigned numeric context
//    ids; the ids, not arrival order, tie an event to its project/target/task
//    across concurrently-executing nodes.
//
// 2. Replayability: the stream is a plain linear sequence. Replaying a saved
//    log and observing a live build deliver the same typed events through the
//    same contract, so the reconstruction logic has exactly one input shape.
//
// 3. Fidelity: payloads keep the engine's semi-structured message text
//    verbatim. Structured sub-fields (item groups, task parameters, copy
//    operations) are mined out of the text downstream, never at capture time.

/// One typed build-engine event.
///
/// Events arrive in wall-clock order but interleaved across concurrently
/// executing projects and nodes; only the context ids correlate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEvent {
    /// Wall-clock time the engine raised the event (UTC).
    pub timestamp: DateTime<Utc>,

    /// Engine-assigned numeric ids locating the event in the build.
    #[serde(default)]
    pub context: BuildEventContext,

    /// Event type and content (tagged enum).
    #[serde(flatten)]
    pub payload: BuildEventPayload,
}

impl BuildEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        context: BuildEventContext,
        payload: BuildEventPayload,
    ) -> Self {
        Self {
            timestamp,
            context,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::payload::MessagePayload;

    #[test]
    fn test_event_serde_round_trip() {
        let event = BuildEvent::new(
            Utc::now(),
            BuildEventContext::for_task(1, 2, 3),
            BuildEventPayload::Message(MessagePayload {
                text: "Building target".to_string(),
                importance: None,
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: BuildEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(back.context.task_id, Some(3));
        match back.payload {
            BuildEventPayload::Message(payload) => {
                assert_eq!(payload.text, "Building target")
            }
            _ => panic!("Wrong payload type"),
        }
    }

    #[test]
    fn test_event_context_defaults_when_absent() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","type":"status","content":{"text":"idle"}}"#;
        let event: BuildEvent = serde_json::from_str(json).unwrap();

        assert!(event.context.is_build_level());
        match event.payload {
            BuildEventPayload::Status(payload) => assert_eq!(payload.text, "idle"),
            _ => panic!("Wrong payload type"),
        }
    }
}
