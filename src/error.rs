//! Error types for signscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignscribeError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Reference landmark asset errors
    #[error("Invalid reference landmarks: {message}")]
    ReferenceLandmarks { message: String },

    // Per-frame errors
    #[error("Failed to decode frame: {message}")]
    Decode { message: String },

    #[error("Landmark detection failed: {message}")]
    Detection { message: String },

    #[error("Gloss classification failed: {message}")]
    Classification { message: String },

    // Text generation errors
    #[error("Text generation failed: {message}")]
    Generation { message: String },

    // Transport errors
    #[error("Transport error: {message}")]
    Transport { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SignscribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = SignscribeError::ConfigInvalidValue {
            key: "frames.min_sequence".to_string(),
            message: "must not exceed frames.capacity".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for frames.min_sequence: must not exceed frames.capacity"
        );
    }

    #[test]
    fn test_decode_display() {
        let error = SignscribeError::Decode {
            message: "missing data-URI separator".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to decode frame: missing data-URI separator"
        );
    }

    #[test]
    fn test_detection_display() {
        let error = SignscribeError::Detection {
            message: "detector offline".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Landmark detection failed: detector offline"
        );
    }

    #[test]
    fn test_classification_display() {
        let error = SignscribeError::Classification {
            message: "empty sequence".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Gloss classification failed: empty sequence"
        );
    }

    #[test]
    fn test_generation_display() {
        let error = SignscribeError::Generation {
            message: "HTTP 503".to_string(),
        };
        assert_eq!(error.to_string(), "Text generation failed: HTTP 503");
    }

    #[test]
    fn test_transport_display() {
        let error = SignscribeError::Transport {
            message: "peer closed".to_string(),
        };
        assert_eq!(error.to_string(), "Transport error: peer closed");
    }

    #[test]
    fn test_reference_landmarks_display() {
        let error = SignscribeError::ReferenceLandmarks {
            message: "pose has 12 points".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid reference landmarks: pose has 12 points"
        );
    }

    #[test]
    fn test_other_display() {
        let error = SignscribeError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: SignscribeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: SignscribeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: SignscribeError = json_error.into();
        assert!(error.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: SignscribeError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SignscribeError>();
        assert_sync::<SignscribeError>();
    }
}
