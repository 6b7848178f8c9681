//! Per-connection streaming session.
//!
//! A session owns one frame window, one gloss window and one text buffer.
//! While `Streaming`, two activities share them:
//!
//! - ingest: one pass per inbound frame message, run on the blocking pool
//!   and replying with an [`IngestReport`](crate::protocol::IngestReport)
//!   or an error reply;
//! - generate: a spawned task ticking every generation interval, replying
//!   with a [`GenerationReport`](crate::protocol::GenerationReport).
//!
//! Either activity ending the transport moves the session to `Closing`;
//! both observe the state channel and stop promptly. Buffers are cleared
//! once `Closed` is reached.

pub mod events;
mod generate;
mod ingest;
pub mod report;
pub mod transport;

pub use events::{SessionEvent, SkipReason};
pub use report::{CollectingReporter, ErrorReporter, TracingReporter};
pub use transport::{ChannelSink, ChannelSource, ClientEnd, FrameSource, ReplySink, channel_transport};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Result, SignscribeError};
use crate::protocol::{IngestReport, Reply};
use crate::window::{FrameWindow, GlossWindow, TextBuffer};
use events::EventTap;
use generate::GenerateLoop;
use ingest::Ingestor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Session lifecycle. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Connecting,
    Streaming,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Streaming => "streaming",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Totals reported once a session is closed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames_received: u64,
    pub glosses_confirmed: u64,
    pub generations: u64,
    /// Text buffer contents at close.
    pub text: String,
}

/// The three structures shared by a session's activities, one lock each.
#[derive(Debug)]
pub(crate) struct SessionBuffers {
    pub(crate) frames: Mutex<FrameWindow>,
    pub(crate) glosses: Mutex<GlossWindow>,
    pub(crate) text: Mutex<TextBuffer>,
}

impl SessionBuffers {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            frames: Mutex::new(FrameWindow::new(config.frames.window())),
            glosses: Mutex::new(GlossWindow::new(config.glosses.window())),
            text: Mutex::new(TextBuffer::new(config.session.text_capacity)),
        }
    }

    fn clear(&self) {
        lock(&self.frames).clear();
        lock(&self.glosses).clear();
        lock(&self.text).clear();
    }
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Moves the session forward to `to`. Returns false if it was already there
/// or past it.
fn advance(control: &watch::Sender<SessionState>, to: SessionState) -> bool {
    control.send_if_modified(|state| {
        if *state < to {
            *state = to;
            true
        } else {
            false
        }
    })
}

/// Resolves once the session has left `Streaming`.
pub(crate) async fn stopped(state: &mut watch::Receiver<SessionState>) {
    if state
        .wait_for(|s| *s != SessionState::Streaming)
        .await
        .is_err()
    {
        tracing::trace!("Session state channel closed");
    }
}

/// Sends a reply unless the session stops first.
///
/// Returns `Ok(false)` when the reply was dropped because the session is
/// no longer streaming.
pub(crate) async fn deliver<T: Serialize>(
    sink: &dyn ReplySink,
    reply: &Reply<T>,
    state: &mut watch::Receiver<SessionState>,
) -> Result<bool> {
    let text = reply.to_json()?;
    tokio::select! {
        biased;
        _ = stopped(state) => Ok(false),
        sent = sink.send_text(text) => sent.map(|()| true),
    }
}

/// Cloneable control handle for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    control: Arc<watch::Sender<SessionState>>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        *self.control.borrow()
    }

    /// Asks the session to stop. Returns false if it was already stopping.
    pub fn close(&self) -> bool {
        advance(&self.control, SessionState::Closing)
    }

    /// Waits until the session has released its buffers.
    pub async fn wait_closed(&self) {
        let mut rx = self.control.subscribe();
        if rx.wait_for(|s| *s == SessionState::Closed).await.is_err() {
            tracing::trace!("Session state channel closed");
        }
    }
}

/// Moves a dropped, still-running session to `Closing` so its spawned
/// generation task stops.
struct CloseOnDrop(Arc<watch::Sender<SessionState>>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        advance(&self.0, SessionState::Closing);
    }
}

pub struct StreamSession {
    engine: Arc<Engine>,
    buffers: Arc<SessionBuffers>,
    control: Arc<watch::Sender<SessionState>>,
    events: EventTap,
}

impl StreamSession {
    pub fn new(engine: Arc<Engine>) -> Self {
        let buffers = Arc::new(SessionBuffers::new(engine.config()));
        let (control, _) = watch::channel(SessionState::Connecting);
        Self {
            engine,
            buffers,
            control: Arc::new(control),
            events: EventTap::default(),
        }
    }

    /// Publish [`SessionEvent`]s on `tx`. Sends never block the session.
    pub fn with_event_sender(mut self, tx: crossbeam_channel::Sender<SessionEvent>) -> Self {
        self.events = EventTap::new(Some(tx));
        self
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.control.borrow()
    }

    /// In-process transport sized by `session.outbound_buffer`.
    pub fn channel_transport(&self) -> (ClientEnd, ChannelSource, ChannelSink) {
        transport::channel_transport(self.engine.config().session.outbound_buffer)
    }

    fn announce(&self, state: SessionState) {
        tracing::info!(%state, "Session state changed");
        self.events.emit(SessionEvent::StateChanged { state });
    }

    /// Runs the session over a connected transport until the client
    /// disconnects or the session is closed through its handle.
    ///
    /// Per-frame and per-tick failures are replied to the client and never
    /// end the session. The returned error only signals that the generation
    /// task panicked; the session is `Closed` either way.
    pub async fn run<S, K>(self, mut source: S, sink: K) -> Result<SessionSummary>
    where
        S: FrameSource,
        K: ReplySink + 'static,
    {
        let _guard = CloseOnDrop(Arc::clone(&self.control));
        let sink: Arc<dyn ReplySink> = Arc::new(sink);
        let mut state = self.control.subscribe();

        let mut summary = SessionSummary::default();
        let mut failure = None;

        if advance(&self.control, SessionState::Streaming) {
            self.announce(SessionState::Streaming);

            let generation = tokio::spawn(
                GenerateLoop {
                    engine: Arc::clone(&self.engine),
                    buffers: Arc::clone(&self.buffers),
                    sink: Arc::clone(&sink),
                    control: Arc::clone(&self.control),
                    state: self.control.subscribe(),
                    events: self.events.clone(),
                }
                .run(),
            );

            let ingestor = Arc::new(Mutex::new(Ingestor::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.buffers),
                self.events.clone(),
                self.control.subscribe(),
            )));
            let (received, confirmed) = self
                .ingest(&mut source, sink.as_ref(), &ingestor, &mut state)
                .await;
            summary.frames_received = received;
            summary.glosses_confirmed = confirmed;

            advance(&self.control, SessionState::Closing);
            self.announce(SessionState::Closing);

            match generation.await {
                Ok(generations) => summary.generations = generations,
                Err(e) => {
                    tracing::warn!(error = %e, "Generation task failed");
                    failure = Some(SignscribeError::Other(format!("generation task failed: {e}")));
                }
            }
        } else {
            tracing::debug!("Session closed before streaming started");
        }

        summary.text = lock(&self.buffers.text).context();
        self.buffers.clear();
        advance(&self.control, SessionState::Closed);
        self.announce(SessionState::Closed);

        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Returns the number of frames received and glosses confirmed.
    async fn ingest<S: FrameSource>(
        &self,
        source: &mut S,
        sink: &dyn ReplySink,
        ingestor: &Arc<Mutex<Ingestor>>,
        state: &mut watch::Receiver<SessionState>,
    ) -> (u64, u64) {
        let mut received = 0;
        let mut confirmed = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = stopped(state) => break,
                next = source.next_frame() => next,
            };

            let message = match next {
                Ok(Some(message)) => message,
                Ok(None) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::info!(error = %e, "Transport closed");
                    break;
                }
            };
            received += 1;

            // Detection and classification block; run them on the blocking pool
            let worker = Arc::clone(ingestor);
            let task = tokio::task::spawn_blocking(move || lock(&worker).process(&message));
            let result = tokio::select! {
                biased;
                _ = stopped(state) => {
                    tracing::debug!("Frame abandoned, session closing");
                    break;
                }
                joined = task => joined.unwrap_or_else(|e| {
                    Err(SignscribeError::Other(format!("frame processing panicked: {e}")))
                }),
            };

            match &result {
                Ok(report) if report.confirmed => confirmed += 1,
                Ok(_) => {}
                Err(e) => {
                    self.engine.reporter().report("ingest", e);
                    self.events.emit(SessionEvent::FrameRejected {
                        message: e.to_string(),
                    });
                }
            }

            let reply: Reply<IngestReport> = result.into();
            match deliver(sink, &reply, state).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::info!(error = %e, "Reply delivery failed");
                    break;
                }
            }
        }
        (received, confirmed)
    }
}
