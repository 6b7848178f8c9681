//! signscribe - live sign-language gloss recognition
//!
//! Stabilizes per-frame hand and pose landmarks, windows them for a gloss
//! classifier, aggregates confirmed glosses over a silence-bounded window and
//! periodically turns them into English text.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod detect;
pub mod engine;
pub mod error;
pub mod generate;
pub mod landmarks;
pub mod protocol;
pub mod session;
pub mod simulate;
pub mod window;

// Model collaborators
pub use classify::{GlossClassifier, Prediction};
pub use detect::LandmarkDetector;
pub use generate::{GenerationRequest, TextGenerator};

// Core pipeline
pub use engine::Engine;
pub use landmarks::{CorrectedFrame, LandmarkCorrector, LandmarkSet, PrevLandmarks};
pub use session::{SessionHandle, SessionState, SessionSummary, StreamSession};
pub use window::{FrameWindow, GlossWindow, TextBuffer};

// Error handling
pub use error::{Result, SignscribeError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
