//! Rolling window of corrected frames for the sequence classifier.

use crate::defaults;
use crate::landmarks::CorrectedFrame;
use std::collections::VecDeque;

/// Configuration for the frame window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindowConfig {
    /// Frames kept; the oldest is evicted beyond this.
    pub capacity: usize,
    /// Frames required before `snapshot` returns anything.
    pub min_sequence: usize,
}

impl Default for FrameWindowConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::FRAME_WINDOW_CAPACITY,
            min_sequence: defaults::MIN_SEQUENCE_LENGTH,
        }
    }
}

/// Bounded FIFO of corrected frames in push order.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    frames: VecDeque<CorrectedFrame>,
    config: FrameWindowConfig,
}

impl FrameWindow {
    pub fn new(config: FrameWindowConfig) -> Self {
        Self {
            frames: VecDeque::with_capacity(config.capacity),
            config,
        }
    }

    /// Appends a frame, evicting the oldest when full.
    pub fn push(&mut self, frame: CorrectedFrame) {
        if self.config.capacity == 0 {
            return;
        }
        while self.frames.len() >= self.config.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Current frames oldest-first, or `None` while fewer than `min_sequence`
    /// have been collected. `None` means "skip sequence prediction this tick".
    pub fn snapshot(&self) -> Option<Vec<CorrectedFrame>> {
        if self.is_ready() {
            Some(self.frames.iter().cloned().collect())
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.frames.len() >= self.config.min_sequence
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn config(&self) -> FrameWindowConfig {
        self.config
    }
}

impl Default for FrameWindow {
    fn default() -> Self {
        Self::new(FrameWindowConfig::default())
    }
}
