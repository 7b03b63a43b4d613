//! In-memory doubles for handler tests.
//!
//! Compiled for unit tests and, through the `test-util` feature, for the
//! integration tests under `tests/`. None of these types touch the network.

mod collecting_handler;
mod collecting_reporter;
mod recording_transport;

pub use collecting_handler::CollectingHandler;
pub use collecting_reporter::CollectingReporter;
pub use recording_transport::{RecordingTransport, SentMail};

/// Returns a `logtest` capture handle, installing the global test logger on
/// first use. `logtest::Logger::start` panics if called twice per process.
#[cfg(test)]
pub(crate) fn capture_logs() -> logtest::Logger {
    static INSTALL: std::sync::Once = std::sync::Once::new();
    INSTALL.call_once(|| {
        logtest::Logger::start();
    });
    logtest::Logger
}
