//! Recording error-channel double.

use std::sync::Arc;

use convomap_core::error::SyncError;
use convomap_core::service::ErrorReporter;
use parking_lot::Mutex;

/// Reporter that records the rendered message of every reported failure.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().len()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &SyncError) {
        self.reports.lock().push(error.to_string());
    }
}
