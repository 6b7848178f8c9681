use crate::defaults;
use crate::error::{Result, SignscribeError};
use crate::window::frames::FrameWindowConfig;
use crate::window::glosses::GlossWindowConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub frames: FramesConfig,
    pub glosses: GlossesConfig,
    pub classifier: ClassifierConfig,
    pub session: SessionConfig,
    pub landmarks: LandmarksConfig,
    pub generator: GeneratorConfig,
}

/// Frame window configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FramesConfig {
    pub capacity: usize,
    pub min_sequence: usize,
}

/// Gloss window configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlossesConfig {
    pub capacity: usize,
    pub min_trigger: usize,
    pub max_consume: usize,
    pub silence_timeout_ms: u64,
}

/// Classifier thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub word_threshold: f32,
}

/// Per-connection session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub generation_interval_ms: u64,
    pub text_capacity: usize,
    pub outbound_buffer: usize,
}

/// Canonical landmark asset configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LandmarksConfig {
    pub reference_path: Option<PathBuf>,
}

/// Text generator client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::FRAME_WINDOW_CAPACITY,
            min_sequence: defaults::MIN_SEQUENCE_LENGTH,
        }
    }
}

impl Default for GlossesConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::GLOSS_WINDOW_CAPACITY,
            min_trigger: defaults::GLOSS_MIN_TRIGGER,
            max_consume: defaults::GLOSS_MAX_CONSUME,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            word_threshold: defaults::WORD_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            generation_interval_ms: defaults::GENERATION_INTERVAL_MS,
            text_capacity: defaults::TEXT_BUFFER_CAPACITY,
            outbound_buffer: defaults::OUTBOUND_BUFFER,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::GENERATOR_ENDPOINT.to_string(),
            model: defaults::GENERATOR_MODEL.to_string(),
            api_key_env: defaults::GENERATOR_API_KEY_ENV.to_string(),
            timeout_ms: defaults::GENERATOR_TIMEOUT_MS,
            temperature: defaults::GENERATOR_TEMPERATURE,
        }
    }
}

impl FramesConfig {
    pub fn window(&self) -> FrameWindowConfig {
        FrameWindowConfig {
            capacity: self.capacity,
            min_sequence: self.min_sequence,
        }
    }
}

impl GlossesConfig {
    pub fn window(&self) -> GlossWindowConfig {
        GlossWindowConfig {
            capacity: self.capacity,
            min_trigger: self.min_trigger,
            max_consume: self.max_consume,
            silence_timeout: Duration::from_millis(self.silence_timeout_ms),
        }
    }
}

impl SessionConfig {
    pub fn generation_interval(&self) -> Duration {
        Duration::from_millis(self.generation_interval_ms)
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file is missing.
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SIGNSCRIBE_GENERATOR_MODEL → generator.model
    /// - SIGNSCRIBE_GENERATOR_ENDPOINT → generator.endpoint
    /// - SIGNSCRIBE_REFERENCE → landmarks.reference_path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SIGNSCRIBE_GENERATOR_MODEL")
            && !model.is_empty()
        {
            self.generator.model = model;
        }

        if let Ok(endpoint) = std::env::var("SIGNSCRIBE_GENERATOR_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.generator.endpoint = endpoint;
        }

        if let Ok(reference) = std::env::var("SIGNSCRIBE_REFERENCE")
            && !reference.is_empty()
        {
            self.landmarks.reference_path = Some(PathBuf::from(reference));
        }

        self
    }

    /// Reject values the windows and timers cannot work with.
    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, message: &str) -> SignscribeError {
            SignscribeError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            }
        }

        if self.frames.capacity == 0 {
            return Err(invalid("frames.capacity", "must be positive"));
        }
        if self.frames.min_sequence == 0 {
            return Err(invalid("frames.min_sequence", "must be positive"));
        }
        if self.frames.min_sequence > self.frames.capacity {
            return Err(invalid(
                "frames.min_sequence",
                "must not exceed frames.capacity",
            ));
        }
        if self.glosses.capacity == 0 {
            return Err(invalid("glosses.capacity", "must be positive"));
        }
        if self.glosses.min_trigger == 0 {
            return Err(invalid("glosses.min_trigger", "must be positive"));
        }
        if self.glosses.min_trigger > self.glosses.capacity {
            return Err(invalid(
                "glosses.min_trigger",
                "must not exceed glosses.capacity",
            ));
        }
        if self.glosses.max_consume == 0 {
            return Err(invalid("glosses.max_consume", "must be positive"));
        }
        if self.glosses.silence_timeout_ms == 0 {
            return Err(invalid("glosses.silence_timeout_ms", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.classifier.word_threshold) {
            return Err(invalid(
                "classifier.word_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if self.session.generation_interval_ms == 0 {
            return Err(invalid("session.generation_interval_ms", "must be positive"));
        }
        if self.session.text_capacity == 0 {
            return Err(invalid("session.text_capacity", "must be positive"));
        }
        if self.session.outbound_buffer == 0 {
            return Err(invalid("session.outbound_buffer", "must be positive"));
        }
        if self.generator.timeout_ms == 0 {
            return Err(invalid("generator.timeout_ms", "must be positive"));
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/signscribe/config.toml on Linux, or a relative
    /// `signscribe/config.toml` when no config directory is known.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("signscribe")
            .join("config.toml")
    }
}
