//! Sink for failures of best-effort cache work.

use karar_core::Error;

/// Receives errors that the resolver swallows.
pub trait FailureReporter: Send + Sync {
    /// `operation` names the store call that failed.
    fn report(&self, operation: &'static str, query: &str, error: &Error);
}

/// Emits a structured warning per failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, operation: &'static str, query: &str, error: &Error) {
        tracing::warn!(operation, query, error = %error, "cache operation failed");
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    operations: std::sync::Mutex<Vec<&'static str>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn operations(&self) -> Vec<&'static str> {
        self.operations.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl FailureReporter for RecordingReporter {
    fn report(&self, operation: &'static str, _query: &str, _error: &Error) {
        self.operations.lock().unwrap().push(operation);
    }
}
