use std::any::Any;

use thiserror::Error;

use crate::log_record::FemtoLogRecord;
use crate::transport::TransportError;

/// Errors a handler may return to the dispatching logger.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler has been closed and no longer accepts records.
    #[error("handler is closed")]
    Closed,
    /// The mail transport refused or failed to deliver a message.
    #[error("mail delivery failed: {0}")]
    Transport(#[from] TransportError),
}

/// Trait implemented by all log handlers.
///
/// Handlers are shared between threads behind `Arc`, so implementations must
/// be `Send + Sync` and use interior mutability for any state they keep.
pub trait FemtoHandlerTrait: Send + Sync {
    /// Dispatch a log record for handling.
    fn handle(&self, record: FemtoLogRecord) -> Result<(), HandlerError>;

    /// Flush any buffered output. Returns `true` when everything was written.
    fn flush(&self) -> bool {
        true
    }

    /// Expose the concrete handler for downcasting.
    fn as_any(&self) -> &dyn Any;
}
