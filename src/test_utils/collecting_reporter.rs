//! Error reporter that keeps what it is given.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error_reporter::ErrorReporter;
use crate::handler::HandlerError;

/// Stores `(source, error text)` pairs for later assertions.
#[derive(Clone, Default)]
pub struct CollectingReporter {
    reports: Arc<Mutex<Vec<(String, String)>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, source: &str, error: &HandlerError) {
        self.reports
            .lock()
            .push((source.to_owned(), error.to_string()));
    }
}
