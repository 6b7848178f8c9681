//! Reporting of per-frame and per-tick failures that do not end a session.

use crate::error::SignscribeError;
use std::sync::{Arc, Mutex, PoisonError};

/// Trait for reporting recoverable session errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a session activity (`"ingest"`, `"generate"`, `"upload"`).
    fn report(&self, activity: &str, error: &SignscribeError);
}

/// Default reporter: one `warn` event per error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, activity: &str, error: &SignscribeError) {
        tracing::warn!(activity, error = %error, "Recoverable session error");
    }
}

/// Reporter that keeps `(activity, message)` pairs in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    reports: Arc<Mutex<Vec<(String, String)>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages reported by `activity`.
    pub fn messages_for(&self, activity: &str) -> Vec<String> {
        self.reports()
            .into_iter()
            .filter(|(a, _)| a == activity)
            .map(|(_, message)| message)
            .collect()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, activity: &str, error: &SignscribeError) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((activity.to_string(), error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_reporter_does_not_panic() {
        let reporter = TracingReporter;
        reporter.report("ingest", &SignscribeError::Other("test error".to_string()));
    }

    #[test]
    fn test_collecting_reporter_groups_by_activity() {
        let reporter = CollectingReporter::new();
        let shared = reporter.clone();

        shared.report(
            "generate",
            &SignscribeError::Generation {
                message: "timeout".to_string(),
            },
        );
        shared.report("ingest", &SignscribeError::Other("bad".to_string()));

        assert_eq!(reporter.reports().len(), 2);
        assert_eq!(
            reporter.messages_for("generate"),
            vec!["Text generation failed: timeout".to_string()]
        );
    }
}
