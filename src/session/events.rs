use crate::session::SessionState;
use serde::{Deserialize, Serialize};

/// Observable session milestones, for embedding applications and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged { state: SessionState },
    GlossConfirmed { gloss: String, confidence: f32 },
    FrameRejected { message: String },
    TextGenerated { gloss: String, text: String },
    /// A generation tick produced no text.
    GenerationSkipped { reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotEnoughGlosses,
    GeneratorFailed,
    EmptyOutput,
}

/// Non-blocking event tap. A full or closed channel drops the event.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventTap {
    tx: Option<crossbeam_channel::Sender<SessionEvent>>,
}

impl EventTap {
    pub(crate) fn new(tx: Option<crossbeam_channel::Sender<SessionEvent>>) -> Self {
        Self { tx }
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        if let Some(ref tx) = self.tx
            && tx.try_send(event).is_err()
        {
            // Channel full or closed - observers are optional
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_sender_is_noop() {
        EventTap::default().emit(SessionEvent::FrameRejected {
            message: "x".to_string(),
        });
    }

    #[test]
    fn test_emit_drops_when_full() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let tap = EventTap::new(Some(tx));

        tap.emit(SessionEvent::StateChanged {
            state: SessionState::Streaming,
        });
        tap.emit(SessionEvent::StateChanged {
            state: SessionState::Closing,
        });

        assert_eq!(rx.len(), 1);
        assert_eq!(
            rx.recv().unwrap(),
            SessionEvent::StateChanged {
                state: SessionState::Streaming
            }
        );
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        EventTap::new(Some(tx)).emit(SessionEvent::GenerationSkipped {
            reason: SkipReason::EmptyOutput,
        });
    }

    #[test]
    fn test_event_json_shape() {
        let event = SessionEvent::GenerationSkipped {
            reason: SkipReason::NotEnoughGlosses,
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"generation_skipped","reason":"not_enough_glosses"}"#
        );
    }
}
