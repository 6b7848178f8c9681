//! Time-bounded window of confirmed glosses.
//!
//! Glosses accumulate while the signer keeps signing. A pause longer than
//! the silence timeout starts a new utterance. Once enough distinct glosses
//! are present, `collapse` turns the oldest ones into the phrase handed to
//! the text generator.

use crate::defaults;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Configuration for the gloss window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlossWindowConfig {
    /// Maximum entries held; the oldest is evicted beyond this.
    pub capacity: usize,
    /// Distinct glosses required before `collapse` returns a phrase.
    pub min_trigger: usize,
    /// Maximum glosses included in one phrase.
    pub max_consume: usize,
    /// Inactivity after which the window is considered stale.
    pub silence_timeout: Duration,
}

impl Default for GlossWindowConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::GLOSS_WINDOW_CAPACITY,
            min_trigger: defaults::GLOSS_MIN_TRIGGER,
            max_consume: defaults::GLOSS_MAX_CONSUME,
            silence_timeout: defaults::silence_timeout(),
        }
    }
}

/// A gloss and the instant it was first confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossEntry {
    pub token: String,
    pub observed_at: Instant,
}

/// Deduplicating, insertion-ordered gloss window.
#[derive(Debug, Clone)]
pub struct GlossWindow {
    entries: VecDeque<GlossEntry>,
    last_append: Option<Instant>,
    config: GlossWindowConfig,
}

impl GlossWindow {
    pub fn new(config: GlossWindowConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            last_append: None,
            config,
        }
    }

    /// Records `token` as confirmed at `now`.
    ///
    /// Stale state is dropped first: a gap longer than the silence timeout
    /// since the previous append clears the whole window, and any entry
    /// older than the timeout is evicted. A token already present is not
    /// inserted again, but still counts as activity.
    pub fn append(&mut self, token: &str, now: Instant) {
        self.expire(now);

        if !self.contains(token) {
            if self.entries.len() >= self.config.capacity {
                self.entries.pop_front();
            }
            if self.config.capacity > 0 {
                self.entries.push_back(GlossEntry {
                    token: token.to_string(),
                    observed_at: now,
                });
            }
        }

        self.last_append = Some(now);
    }

    /// Oldest-first phrase of at most `max_consume` glosses, or an empty
    /// string while fewer than `min_trigger` are present.
    pub fn collapse(&self) -> String {
        if self.entries.len() < self.config.min_trigger {
            return String::new();
        }
        self.entries
            .iter()
            .take(self.config.max_consume)
            .map(|entry| entry.token.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn expire(&mut self, now: Instant) {
        let timeout = self.config.silence_timeout;

        if let Some(last) = self.last_append
            && now.saturating_duration_since(last) > timeout
        {
            self.entries.clear();
        }

        while let Some(front) = self.entries.front() {
            if now.saturating_duration_since(front.observed_at) > timeout {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.iter().any(|entry| entry.token == token)
    }

    /// Tokens in insertion order.
    pub fn tokens(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.token.as_str()).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &GlossEntry> {
        self.entries.iter()
    }

    pub fn last_append(&self) -> Option<Instant> {
        self.last_append
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_append = None;
    }

    pub fn config(&self) -> GlossWindowConfig {
        self.config
    }
}

impl Default for GlossWindow {
    fn default() -> Self {
        Self::new(GlossWindowConfig::default())
    }
}
