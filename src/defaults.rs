//! Default configuration constants for signscribe.
//!
//! Shared by the config layer and the component configs so both agree on
//! the same values.

use std::time::Duration;

/// Number of corrected frames kept for the sequence classifier.
pub const FRAME_WINDOW_CAPACITY: usize = 40;

/// Frames required before the frame window exposes a sequence.
pub const MIN_SEQUENCE_LENGTH: usize = 3;

/// Number of glosses held in the gloss window.
pub const GLOSS_WINDOW_CAPACITY: usize = 8;

/// Distinct glosses needed before a phrase is handed to the generator.
pub const GLOSS_MIN_TRIGGER: usize = 4;

/// Maximum glosses sent per generation call (oldest first).
pub const GLOSS_MAX_CONSUME: usize = 6;

/// Inactivity after which accumulated glosses are discarded.
///
/// 3 seconds of no confirmed gloss is treated as the end of an utterance.
pub const SILENCE_TIMEOUT_MS: u64 = 3000;

/// Classifier confidence required to confirm a gloss.
///
/// The word model is sigmoid-activated and noisy on transitional frames,
/// so only near-certain predictions are kept.
pub const WORD_CONFIDENCE_THRESHOLD: f32 = 0.99;

/// Interval between generation ticks.
pub const GENERATION_INTERVAL_MS: u64 = 1500;

/// Number of generated words kept as context.
pub const TEXT_BUFFER_CAPACITY: usize = 50;

/// Capacity of the in-process reply channel.
pub const OUTBOUND_BUFFER: usize = 64;

/// Default OpenAI-compatible endpoint for the text generator.
pub const GENERATOR_ENDPOINT: &str = "https://openrouter.ai/api/v1";

/// Default generator model.
pub const GENERATOR_MODEL: &str = "meta-llama/llama-3.2-3b-instruct";

/// Environment variable holding the generator API key.
pub const GENERATOR_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Upper bound for a single generator round trip.
pub const GENERATOR_TIMEOUT_MS: u64 = 10_000;

/// Sampling temperature for the generator.
pub const GENERATOR_TEMPERATURE: f32 = 0.7;

/// Shoulder distance below which normalization falls back to unit scale.
pub const MIN_SHOULDER_SCALE: f64 = 1e-6;

/// Convenience: the silence timeout as a `Duration`.
pub fn silence_timeout() -> Duration {
    Duration::from_millis(SILENCE_TIMEOUT_MS)
}

/// Convenience: the generation interval as a `Duration`.
pub fn generation_interval() -> Duration {
    Duration::from_millis(GENERATION_INTERVAL_MS)
}
