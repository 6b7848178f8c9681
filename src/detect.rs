use crate::error::{Result, SignscribeError};
use crate::landmarks::LandmarkSet;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Keypoint detector: raw encoded image in, per-part landmarks out.
///
/// A part the detector did not find is `None` in the returned set; that is
/// not an error. `Err` is reserved for images the detector cannot process.
pub trait LandmarkDetector: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<LandmarkSet>;

    /// Get the name of the detector backend
    fn name(&self) -> &str;
}

impl<T: LandmarkDetector> LandmarkDetector for Arc<T> {
    fn detect(&self, image: &[u8]) -> Result<LandmarkSet> {
        (**self).detect(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock detector for testing.
///
/// Returns scripted landmark sets in order, then falls back to the fixed
/// set once the script is exhausted.
#[derive(Debug, Clone)]
pub struct MockDetector {
    fallback: LandmarkSet,
    script: Arc<Mutex<VecDeque<LandmarkSet>>>,
    should_fail: bool,
}

impl MockDetector {
    /// A detector that finds nothing.
    pub fn new() -> Self {
        Self {
            fallback: LandmarkSet::default(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            should_fail: false,
        }
    }

    /// Return `set` for every image.
    pub fn with_landmarks(mut self, set: LandmarkSet) -> Self {
        self.fallback = set;
        self
    }

    /// Return `sets` one per call before falling back.
    pub fn with_script(self, sets: impl IntoIterator<Item = LandmarkSet>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(sets);
        self
    }

    /// Fail on every image.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkDetector for MockDetector {
    fn detect(&self, _image: &[u8]) -> Result<LandmarkSet> {
        if self.should_fail {
            return Err(SignscribeError::Detection {
                message: "mock detection failure".to_string(),
            });
        }
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(scripted.unwrap_or(self.fallback))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::PrevLandmarks;

    fn full_set() -> LandmarkSet {
        let reference = PrevLandmarks::neutral();
        LandmarkSet {
            left_hand: Some(reference.left_hand),
            right_hand: Some(reference.right_hand),
            pose: Some(reference.pose),
        }
    }

    #[test]
    fn test_default_detects_nothing() {
        let detector = MockDetector::new();
        assert!(detector.detect(b"img").unwrap().is_empty());
    }

    #[test]
    fn test_script_then_fallback() {
        let full = full_set();
        let detector = MockDetector::new()
            .with_landmarks(full)
            .with_script([LandmarkSet::default()]);

        assert!(detector.detect(b"1").unwrap().is_empty());
        assert_eq!(detector.detect(b"2").unwrap(), full);
        assert_eq!(detector.detect(b"3").unwrap(), full);
    }

    #[test]
    fn test_failure() {
        let detector = MockDetector::new().with_failure();
        match detector.detect(b"img") {
            Err(SignscribeError::Detection { message }) => {
                assert_eq!(message, "mock detection failure");
            }
            other => panic!("Expected Detection error, got {:?}", other),
        }
    }

    #[test]
    fn test_detector_trait_is_object_safe() {
        let detector: Box<dyn LandmarkDetector> = Box::new(MockDetector::new());
        assert_eq!(detector.name(), "mock");
        assert!(detector.detect(&[]).is_ok());
    }
}
