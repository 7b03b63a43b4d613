//! A simple handler that accumulates records in memory for test assertions.

use crate::handler::{FemtoHandlerTrait, HandlerError};
use crate::log_record::FemtoLogRecord;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Handler that stores every record it receives for later inspection.
#[derive(Clone, Default)]
pub struct CollectingHandler {
    records: Arc<Mutex<Vec<FemtoLogRecord>>>,
    flushes: Arc<AtomicUsize>,
}

impl CollectingHandler {
    /// Create a new empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of all records received so far.
    pub fn collected(&self) -> Vec<FemtoLogRecord> {
        self.records.lock().clone()
    }

    /// Messages of the collected records, rendered.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message().into_owned())
            .collect()
    }

    /// Number of times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl FemtoHandlerTrait for CollectingHandler {
    fn handle(&self, record: FemtoLogRecord) -> Result<(), HandlerError> {
        self.records.lock().push(record);
        Ok(())
    }

    fn flush(&self) -> bool {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
