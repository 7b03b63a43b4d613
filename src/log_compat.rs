//! Compatibility bridge for the Rust `log` crate.
//!
//! This module provides [`FemtoLogAdapter`], an implementation of `log::Log`
//! that forwards records from the `log` macros into a [`FemtoLogger`] and so
//! into its mail handlers. The bridge is opt-in: call [`install`] once at
//! start-up.
//!
//! Handlers report their own failures through `log::error!`. While the
//! adapter is dispatching on a thread, further records produced on that
//! thread are dropped so such reports cannot loop back into the handler that
//! raised them; [`LogErrorReporter`](crate::error_reporter::LogErrorReporter)
//! writes to stderr instead during that window.

use std::borrow::Cow;
use std::cell::Cell;
use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::level::FemtoLevel;
use crate::log_record::{FemtoLogRecord, RecordMetadata};
use crate::logger::FemtoLogger;

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the adapter is dispatching a record on this thread.
///
/// Anything logged through the `log` facade now is dropped.
pub(crate) fn is_dispatching() -> bool {
    DISPATCHING.with(Cell::get)
}

/// Marks the current thread as dispatching until dropped.
pub(crate) struct DispatchGuard;

impl DispatchGuard {
    /// Returns `None` when the thread is already dispatching.
    pub(crate) fn enter() -> Option<Self> {
        DISPATCHING.with(|flag| {
            if flag.replace(true) {
                None
            } else {
                Some(Self)
            }
        })
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

/// Adapter implementing the Rust `log::Log` trait.
///
/// Every record is converted to a [`FemtoLogRecord`] named after its target
/// (with `::` replaced by `.`) and dispatched through the wrapped logger.
#[derive(Debug, Clone)]
pub struct FemtoLogAdapter {
    logger: Arc<FemtoLogger>,
}

impl FemtoLogAdapter {
    pub fn new(logger: Arc<FemtoLogger>) -> Self {
        Self { logger }
    }

    /// The logger records are dispatched through.
    pub fn logger(&self) -> &Arc<FemtoLogger> {
        &self.logger
    }
}

impl From<log::Level> for FemtoLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => FemtoLevel::Trace,
            log::Level::Debug => FemtoLevel::Debug,
            log::Level::Info => FemtoLevel::Info,
            log::Level::Warn => FemtoLevel::Warn,
            log::Level::Error => FemtoLevel::Error,
        }
    }
}

fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

impl log::Log for FemtoLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.logger
            .is_enabled_for(FemtoLevel::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(_guard) = DispatchGuard::enter() else {
            return;
        };

        let metadata = RecordMetadata {
            module_path: record.module_path().unwrap_or_default().to_string(),
            filename: record.file().unwrap_or_default().to_string(),
            line_number: record.line().unwrap_or(0),
            ..Default::default()
        };
        let femto_record = FemtoLogRecord::with_metadata(
            &normalise_target(record.target()),
            FemtoLevel::from(record.level()),
            &record.args().to_string(),
            metadata,
        );
        self.logger.dispatch_record(femto_record);
    }

    fn flush(&self) {
        if let Some(_guard) = DispatchGuard::enter() {
            self.logger.flush();
        }
    }
}

/// Install `adapter` as the global `log` logger, passing records up to
/// `max_level`.
///
/// Fails when a global logger is already set.
pub fn install(adapter: FemtoLogAdapter, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(adapter))?;
    log::set_max_level(max_level);
    Ok(())
}
