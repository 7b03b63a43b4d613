//! Core logger implementation.
//!
//! [`FemtoLogger`] filters records by level, formats them for the caller and
//! hands them to its handlers. Dispatch is synchronous: every handler has
//! seen the record by the time a logging call returns, so a mail handler's
//! flood decision is made in call order.

mod convenience_methods;


use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use log::warn;
// parking_lot avoids poisoning and matches crate-wide locking strategy
use parking_lot::RwLock;

use crate::{
    formatter::{DefaultFormatter, SharedFormatter},
    handler::FemtoHandlerTrait,
    level::FemtoLevel,
    log_record::FemtoLogRecord,
};

/// A named logger with a minimum level and an explicit list of handlers.
pub struct FemtoLogger {
    /// Identifier used to distinguish log messages from different loggers.
    name: String,
    formatter: SharedFormatter,
    level: AtomicU8,
    handlers: RwLock<Vec<Arc<dyn FemtoHandlerTrait>>>,
}

impl FemtoLogger {
    /// Create a logger called `name` with level `INFO` and no handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formatter: SharedFormatter::new(DefaultFormatter),
            level: AtomicU8::new(u8::from(FemtoLevel::Info)),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Update the logger's minimum level.
    pub fn set_level(&self, level: FemtoLevel) {
        self.level.store(u8::from(level), Ordering::Relaxed);
    }

    pub fn level(&self) -> FemtoLevel {
        FemtoLevel::try_from(self.level.load(Ordering::Relaxed)).unwrap_or(FemtoLevel::Critical)
    }

    /// Return whether a record at `level` would be dispatched.
    pub fn is_enabled_for(&self, level: FemtoLevel) -> bool {
        u8::from(level) >= self.level.load(Ordering::Relaxed)
    }

    /// Log `message` at `level`.
    ///
    /// Returns the record formatted as `name [LEVEL] message` when it passed
    /// the level check, `None` otherwise.
    pub fn log(&self, level: FemtoLevel, message: &str) -> Option<String> {
        if !self.is_enabled_for(level) {
            return None;
        }
        self.log_record(FemtoLogRecord::new(&self.name, level, message))
    }

    /// Log an arbitrary `Display` value at `level`.
    ///
    /// The value is rendered defensively; see
    /// [`MessagePayload::render`](crate::log_record::MessagePayload::render).
    pub fn log_display<T>(&self, level: FemtoLevel, value: T) -> Option<String>
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        if !self.is_enabled_for(level) {
            return None;
        }
        self.log_record(FemtoLogRecord::from_display(&self.name, level, value))
    }

    /// Dispatch a prepared record, returning its formatted text if it passed
    /// the level check.
    pub fn log_record(&self, record: FemtoLogRecord) -> Option<String> {
        if !self.is_enabled_for(record.level) {
            return None;
        }
        let msg = self.formatter.format(&record);
        self.dispatch_to_handlers(record);
        Some(msg)
    }

    /// Dispatch a prepared record without formatting it for the caller.
    pub fn dispatch_record(&self, record: FemtoLogRecord) {
        if self.is_enabled_for(record.level) {
            self.dispatch_to_handlers(record);
        }
    }

    fn dispatch_to_handlers(&self, record: FemtoLogRecord) {
        let handlers = self.handlers.read().clone();
        for handler in &handlers {
            if let Err(err) = handler.handle(record.clone()) {
                warn!("FemtoLogger: handler reported an error: {err}");
            }
        }
    }

    /// Flush every handler. Returns `true` when all of them succeeded.
    pub fn flush(&self) -> bool {
        let handlers = self.handlers.read().clone();
        handlers
            .iter()
            .fold(true, |ok, handler| handler.flush() && ok)
    }

    pub fn add_handler(&self, handler: Arc<dyn FemtoHandlerTrait>) {
        self.handlers.write().push(handler);
    }

    /// Remove `handler`, compared by pointer. Returns whether it was attached.
    pub fn remove_handler(&self, handler: &Arc<dyn FemtoHandlerTrait>) -> bool {
        let mut handlers = self.handlers.write();
        if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            handlers.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl fmt::Debug for FemtoLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FemtoLogger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handler_count())
            .finish()
    }
}
