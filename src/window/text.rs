//! Bounded word history of generated text.

use crate::defaults;
use std::collections::VecDeque;

/// Most recent generated words, oldest first.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    words: VecDeque<String>,
    capacity: usize,
}

impl TextBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Splits `text` on whitespace and appends each word, dropping the
    /// oldest words beyond capacity.
    pub fn extend_words(&mut self, text: &str) {
        if self.capacity == 0 {
            return;
        }
        for word in text.split_whitespace() {
            if self.words.len() >= self.capacity {
                self.words.pop_front();
            }
            self.words.push_back(word.to_string());
        }
    }

    /// Space-joined buffer contents, used as generation context.
    pub fn context(&self) -> String {
        self.words.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(defaults::TEXT_BUFFER_CAPACITY)
    }
}
