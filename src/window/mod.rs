//! Bounded windows shared by a session's two activities.
//!
//! None of these lock internally; the session wraps each in its own mutex.

pub mod frames;
pub mod glosses;
pub mod text;

pub use frames::{FrameWindow, FrameWindowConfig};
pub use glosses::{GlossEntry, GlossWindow, GlossWindowConfig};
pub use text::TextBuffer;
