//! Per-frame ingest: decode, correct, window, classify, confirm.

use crate::classify::Prediction;
use crate::engine::Engine;
use crate::error::{Result, SignscribeError};
use crate::landmarks::{LandmarkCorrector, PrevLandmarks};
use crate::protocol::{IngestReport, decode_frame_payload};
use crate::session::events::{EventTap, SessionEvent};
use crate::session::{SessionBuffers, SessionState, lock};
use std::sync::Arc;
use tokio::sync::watch;

/// Processes inbound frame messages for one session.
///
/// Owns the session's correction history; nothing else reads or writes it.
/// `process` blocks on model calls, so the session runs it on the blocking
/// pool.
pub(crate) struct Ingestor {
    engine: Arc<Engine>,
    buffers: Arc<SessionBuffers>,
    corrector: LandmarkCorrector,
    prev: PrevLandmarks,
    events: EventTap,
    state: watch::Receiver<SessionState>,
}

impl Ingestor {
    pub(crate) fn new(
        engine: Arc<Engine>,
        buffers: Arc<SessionBuffers>,
        events: EventTap,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        let prev = engine.reference();
        Self {
            engine,
            buffers,
            corrector: LandmarkCorrector::new(),
            prev,
            events,
            state,
        }
    }

    /// Handles one frame message.
    ///
    /// The corrected frame is pushed before classification, so a frame that
    /// later fails classification still counts toward the sequence. Nothing
    /// is written to the session buffers once the session left `Streaming`.
    pub(crate) fn process(&mut self, message: &str) -> Result<IngestReport> {
        let image = decode_frame_payload(message)?;
        let detected = self.engine.detector().detect(&image)?;
        let frame = self.corrector.correct(&detected, &mut self.prev);

        self.ensure_streaming()?;
        let (sequence, buffered_frames) = {
            let mut frames = lock(&self.buffers.frames);
            frames.push(frame);
            (frames.snapshot(), frames.len())
        };

        let prediction = match sequence {
            Some(sequence) => self.engine.classifier().classify(&sequence)?,
            None => Prediction::empty(),
        };

        let confirmed = prediction.is_confirmed(self.engine.config().classifier.word_threshold);
        if confirmed {
            self.ensure_streaming()?;
            let now = self.engine.clock().now();
            lock(&self.buffers.glosses).append(&prediction.label, now);
            tracing::debug!(gloss = %prediction.label, confidence = prediction.confidence, "Gloss confirmed");
            self.events.emit(SessionEvent::GlossConfirmed {
                gloss: prediction.label.clone(),
                confidence: prediction.confidence,
            });
        }

        Ok(IngestReport {
            word_gloss: prediction.label,
            word_confidence: prediction.confidence,
            confirmed,
            buffered_frames,
        })
    }

    fn ensure_streaming(&self) -> Result<()> {
        let state = *self.state.borrow();
        if state == SessionState::Streaming {
            Ok(())
        } else {
            Err(SignscribeError::Transport {
                message: format!("session {state}"),
            })
        }
    }

    /// Current fallback landmarks.
    #[cfg(test)]
    pub(crate) fn prev(&self) -> &PrevLandmarks {
        &self.prev
    }
}
