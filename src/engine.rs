//! Process-wide recognition engine.
//!
//! Built once at startup from config and the model collaborators, then shared
//! as `Arc<Engine>` by every session and by the one-shot image path.

use crate::classify::{GlossClassifier, Prediction};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::detect::LandmarkDetector;
use crate::error::Result;
use crate::generate::TextGenerator;
use crate::landmarks::{LandmarkCorrector, PrevLandmarks};
use crate::protocol::{Reply, UploadReport};
use crate::session::{ErrorReporter, TracingReporter};
use std::sync::Arc;

pub struct Engine {
    config: Config,
    detector: Arc<dyn LandmarkDetector>,
    classifier: Arc<dyn GlossClassifier>,
    generator: Arc<dyn TextGenerator>,
    reference: PrevLandmarks,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Engine {
    /// Creates an engine with the built-in neutral reference pose.
    pub fn new(
        config: Config,
        detector: Arc<dyn LandmarkDetector>,
        classifier: Arc<dyn GlossClassifier>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            detector,
            classifier,
            generator,
            reference: PrevLandmarks::neutral(),
            clock: Arc::new(SystemClock),
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Like [`Engine::new`], but loads the reference landmarks named by
    /// `config.landmarks.reference_path` when one is set.
    pub fn from_config(
        config: Config,
        detector: Arc<dyn LandmarkDetector>,
        classifier: Arc<dyn GlossClassifier>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        let reference = match &config.landmarks.reference_path {
            Some(path) => PrevLandmarks::load(path)?,
            None => {
                tracing::debug!("No reference landmarks configured, using neutral pose");
                PrevLandmarks::neutral()
            }
        };
        Ok(Self::new(config, detector, classifier, generator).with_reference(reference))
    }

    pub fn with_reference(mut self, reference: PrevLandmarks) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn detector(&self) -> &dyn LandmarkDetector {
        self.detector.as_ref()
    }

    pub fn classifier(&self) -> &dyn GlossClassifier {
        self.classifier.as_ref()
    }

    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        Arc::clone(&self.generator)
    }

    /// Starting landmarks for a fresh correction history.
    pub fn reference(&self) -> PrevLandmarks {
        self.reference
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }

    /// One-shot recognition of a single encoded image.
    ///
    /// Correction runs once against a fresh copy of the reference landmarks,
    /// so the result never depends on earlier requests. Text is the
    /// lowercased label when the classifier is confident enough, else empty.
    pub fn recognize_image(&self, image: &[u8]) -> Reply<UploadReport> {
        let result = self.try_recognize_image(image);
        if let Err(ref e) = result {
            self.reporter.report("upload", e);
        }
        result.into()
    }

    fn try_recognize_image(&self, image: &[u8]) -> Result<UploadReport> {
        let detected = self.detector.detect(image)?;

        let mut prev = self.reference;
        let frame = LandmarkCorrector::new().correct(&detected, &mut prev);

        let prediction: Prediction = self.classifier.classify(std::slice::from_ref(&frame))?;
        let text = if prediction.is_confirmed(self.config.classifier.word_threshold) {
            prediction.label.to_lowercase()
        } else {
            String::new()
        };

        tracing::debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            "One-shot recognition"
        );

        Ok(UploadReport {
            text,
            word_confidence: prediction.confidence,
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("detector", &self.detector.name())
            .field("classifier", &self.classifier.model_name())
            .field("generator", &self.generator.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MockClassifier;
    use crate::detect::MockDetector;
    use crate::generate::MockGenerator;
    use crate::session::CollectingReporter;

    fn engine(detector: MockDetector, classifier: MockClassifier) -> Engine {
        Engine::new(
            Config::default(),
            Arc::new(detector),
            Arc::new(classifier),
            Arc::new(MockGenerator::new()),
        )
    }

    #[test]
    fn test_confident_prediction_is_lowercased() {
        let classifier = MockClassifier::new("word").with_prediction("HELLO", 0.995);
        let engine = engine(MockDetector::new(), classifier.clone());

        let reply = engine.recognize_image(b"jpeg");

        assert_eq!(
            reply,
            Reply::success(UploadReport {
                text: "hello".to_string(),
                word_confidence: 0.995,
            })
        );
        assert_eq!(classifier.calls(), vec![1], "classifier sees exactly one frame");
    }

    #[test]
    fn test_unconfident_prediction_has_empty_text() {
        let engine = engine(MockDetector::new(), MockClassifier::new("word").with_prediction("HELLO", 0.5));

        let report = engine.recognize_image(b"jpeg").result().cloned().unwrap();
        assert_eq!(report.text, "");
        assert_eq!(report.word_confidence, 0.5);
    }

    #[test]
    fn test_threshold_from_config() {
        let mut config = Config::default();
        config.classifier.word_threshold = 0.5;
        let engine = Engine::new(
            config,
            Arc::new(MockDetector::new()),
            Arc::new(MockClassifier::new("word").with_prediction("YOU", 0.5)),
            Arc::new(MockGenerator::new()),
        );

        assert_eq!(engine.recognize_image(b"x").result().unwrap().text, "you");
    }

    #[test]
    fn test_detector_failure_is_reported_and_replied() {
        let reporter = CollectingReporter::new();
        let engine = engine(MockDetector::new().with_failure(), MockClassifier::new("word"))
            .with_error_reporter(Arc::new(reporter.clone()));

        let reply = engine.recognize_image(b"x");

        assert_eq!(reply, Reply::error("Landmark detection failed: mock detection failure"));
        assert_eq!(reporter.messages_for("upload").len(), 1);
    }

    #[test]
    fn test_requests_do_not_share_history() {
        let reference = PrevLandmarks::neutral();
        let engine = engine(MockDetector::new(), MockClassifier::new("word")).with_reference(reference);

        engine.recognize_image(b"a");
        engine.recognize_image(b"b");

        assert_eq!(engine.reference(), reference);
    }

    #[test]
    fn test_from_config_loads_reference_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");
        let mut reference = PrevLandmarks::neutral();
        reference.pose.0[0] = crate::landmarks::Point3::new(0.25, 0.5, 0.0);
        std::fs::write(&path, serde_json::to_string(&reference).unwrap()).unwrap();

        let mut config = Config::default();
        config.landmarks.reference_path = Some(path);
        let engine = Engine::from_config(
            config,
            Arc::new(MockDetector::new()),
            Arc::new(MockClassifier::new("word")),
            Arc::new(MockGenerator::new()),
        )
        .unwrap();

        assert_eq!(engine.reference().pose.0[0], crate::landmarks::Point3::new(0.25, 0.5, 0.0));
    }

    #[test]
    fn test_from_config_missing_reference_fails() {
        let mut config = Config::default();
        config.landmarks.reference_path = Some("/nonexistent/reference.json".into());

        let result = Engine::from_config(
            config,
            Arc::new(MockDetector::new()),
            Arc::new(MockClassifier::new("word")),
            Arc::new(MockGenerator::new()),
        );
        assert!(result.is_err());
    }
}
