use crate::error::{Result, SignscribeError};
use crate::landmarks::CorrectedFrame;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// A classifier's best label and its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
        }
    }

    /// The "nothing to report" prediction used when no sequence is ready.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this prediction counts as a confirmed gloss at `threshold`.
    pub fn is_confirmed(&self, threshold: f32) -> bool {
        !self.label.is_empty() && self.confidence >= threshold
    }
}

/// Gloss classifier over one or more corrected frames.
///
/// The live path passes the frame window's sequence; the one-shot path passes
/// a single frame.
pub trait GlossClassifier: Send + Sync {
    fn classify(&self, frames: &[CorrectedFrame]) -> Result<Prediction>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;
}

impl<T: GlossClassifier> GlossClassifier for Arc<T> {
    fn classify(&self, frames: &[CorrectedFrame]) -> Result<Prediction> {
        (**self).classify(frames)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Mock classifier for testing.
///
/// Scripted predictions are returned in order; afterwards every call gets
/// the fixed prediction. The number of frames seen by each call is recorded.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    model_name: String,
    fallback: Prediction,
    script: Arc<Mutex<VecDeque<Prediction>>>,
    calls: Arc<Mutex<Vec<usize>>>,
    should_fail: bool,
}

impl MockClassifier {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            fallback: Prediction::empty(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    pub fn with_prediction(mut self, label: &str, confidence: f32) -> Self {
        self.fallback = Prediction::new(label, confidence);
        self
    }

    pub fn with_script(self, predictions: impl IntoIterator<Item = Prediction>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(predictions);
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sequence lengths passed to `classify`, in call order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl GlossClassifier for MockClassifier {
    fn classify(&self, frames: &[CorrectedFrame]) -> Result<Prediction> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frames.len());

        if self.should_fail {
            return Err(SignscribeError::Classification {
                message: "mock classification failure".to_string(),
            });
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(scripted.unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
