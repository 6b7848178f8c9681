//! Offline gloss-stream simulation behind `signscribe simulate`.
//!
//! Glosses are fed one at a time into a gloss window; after each one the
//! window is collapsed and, once long enough, handed to the text generator
//! with the text produced so far as context.

use crate::config::Config;
use crate::error::Result;
use crate::generate::{GenerationRequest, TextGenerator};
use crate::window::{GlossWindow, TextBuffer};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of feeding one gloss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The window is still below the trigger size.
    Buffered,
    /// The generator produced a sentence for `phrase`.
    Generated { phrase: String, sentence: String },
    /// The generator returned nothing usable for `phrase`.
    Empty { phrase: String },
}

pub struct Simulation {
    window: GlossWindow,
    text: TextBuffer,
    generator: Arc<dyn TextGenerator>,
}

impl Simulation {
    pub fn new(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            window: GlossWindow::new(config.glosses.window()),
            text: TextBuffer::new(config.session.text_capacity),
            generator,
        }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Appends `gloss` as-is and generates if the window is long enough.
    pub async fn feed(&mut self, gloss: &str, now: Instant) -> Result<Step> {
        self.window.append(gloss, now);

        let phrase = self.window.collapse();
        if phrase.is_empty() {
            return Ok(Step::Buffered);
        }

        let request = GenerationRequest::new(&phrase, &self.text.context());
        let sentence = self.generator.generate(&request).await?;
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Ok(Step::Empty { phrase });
        }

        self.text.extend_words(sentence);
        Ok(Step::Generated {
            phrase,
            sentence: sentence.to_string(),
        })
    }

    /// Text generated so far, oldest first.
    pub fn text(&self) -> String {
        self.text.context()
    }
}
