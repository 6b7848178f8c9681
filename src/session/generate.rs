//! Periodic text generation for a streaming session.

use crate::engine::Engine;
use crate::generate::GenerationRequest;
use crate::protocol::{GenerationReport, Reply};
use crate::session::events::{EventTap, SessionEvent, SkipReason};
use crate::session::transport::ReplySink;
use crate::session::{SessionBuffers, SessionState, advance, deliver, lock, stopped};
use std::sync::Arc;
use tokio::sync::watch;

enum Tick {
    Generated { gloss: String, text: String },
    Skipped(SkipReason),
    /// The session stopped while the generator was still running.
    Abandoned,
}

pub(super) struct GenerateLoop {
    pub(super) engine: Arc<Engine>,
    pub(super) buffers: Arc<SessionBuffers>,
    pub(super) sink: Arc<dyn ReplySink>,
    pub(super) control: Arc<watch::Sender<SessionState>>,
    pub(super) state: watch::Receiver<SessionState>,
    pub(super) events: EventTap,
}

impl GenerateLoop {
    /// Sleeps one interval, ticks, repeats. Every completed tick sends one
    /// generation reply, with empty text when nothing was generated.
    /// Returns the number of successful generations.
    pub(super) async fn run(mut self) -> u64 {
        let interval = self.engine.config().session.generation_interval();
        let mut generated = 0;

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut self.state) => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let text = match self.tick().await {
                Tick::Abandoned => {
                    tracing::debug!("Generation abandoned, session closing");
                    break;
                }
                Tick::Skipped(reason) => {
                    tracing::trace!(?reason, "Generation skipped");
                    self.events.emit(SessionEvent::GenerationSkipped { reason });
                    String::new()
                }
                Tick::Generated { gloss, text } => {
                    if *self.state.borrow() != SessionState::Streaming {
                        break;
                    }
                    lock(&self.buffers.text).extend_words(&text);
                    generated += 1;
                    tracing::info!(%gloss, %text, "Text generated");
                    self.events.emit(SessionEvent::TextGenerated {
                        gloss,
                        text: text.clone(),
                    });
                    text
                }
            };

            let reply = Reply::success(GenerationReport { text });
            match deliver(self.sink.as_ref(), &reply, &mut self.state).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::info!(error = %e, "Reply delivery failed");
                    advance(&self.control, SessionState::Closing);
                    break;
                }
            }
        }

        generated
    }

    async fn tick(&mut self) -> Tick {
        let gloss = lock(&self.buffers.glosses).collapse();
        if gloss.is_empty() {
            return Tick::Skipped(SkipReason::NotEnoughGlosses);
        }

        let context = lock(&self.buffers.text).context();
        let request = GenerationRequest { gloss, context };
        let generator = self.engine.generator();

        let outcome = tokio::select! {
            biased;
            _ = stopped(&mut self.state) => return Tick::Abandoned,
            outcome = generator.generate(&request) => outcome,
        };

        match outcome {
            Ok(text) if !text.trim().is_empty() => Tick::Generated {
                gloss: request.gloss,
                text: text.trim().to_string(),
            },
            Ok(_) => Tick::Skipped(SkipReason::EmptyOutput),
            Err(e) => {
                self.engine.reporter().report("generate", &e);
                Tick::Skipped(SkipReason::GeneratorFailed)
            }
        }
    }
}
