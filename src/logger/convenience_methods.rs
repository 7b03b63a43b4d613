//! Convenience logging methods with a fixed level.
//!
//! These take a pre-formatted `message`; use [`FemtoLogger::log_display`]
//! for values that should be rendered lazily.

use crate::level::FemtoLevel;

use super::FemtoLogger;

impl FemtoLogger {
    /// Log a message at DEBUG level.
    pub fn debug(&self, message: &str) -> Option<String> {
        self.log(FemtoLevel::Debug, message)
    }

    /// Log a message at INFO level.
    pub fn info(&self, message: &str) -> Option<String> {
        self.log(FemtoLevel::Info, message)
    }

    /// Log a message at WARN level.
    pub fn warn(&self, message: &str) -> Option<String> {
        self.log(FemtoLevel::Warn, message)
    }

    /// Log a message at ERROR level.
    pub fn error(&self, message: &str) -> Option<String> {
        self.log(FemtoLevel::Error, message)
    }

    /// Log a message at CRITICAL level.
    pub fn critical(&self, message: &str) -> Option<String> {
        self.log(FemtoLevel::Critical, message)
    }
}
