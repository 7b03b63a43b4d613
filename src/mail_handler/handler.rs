//! Public handler type exported by the crate.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::{
    error_reporter::{ErrorReporter, LogErrorReporter},
    handler::{FemtoHandlerTrait, HandlerError},
    level::FemtoLevel,
    log_record::FemtoLogRecord,
    transport::MailTransport,
};

use super::{
    config::MailHandlerConfig,
    flood::{FloodController, FloodState, Verdict},
    message::{EmailMessage, MessageBuilder, MessageKind},
};

const HANDLER_NAME: &str = "FemtoMailHandler";

/// Handler mailing each record, with daily flood protection.
///
/// Every accepted record becomes one message until the flood level is
/// reached; then a single "Too Many Log Entries" notice is sent and the rest
/// of the day's records are dropped. Delivery is synchronous. Failures never
/// reach the caller; they go to the configured [`ErrorReporter`].
pub struct FemtoMailHandler {
    builder: MessageBuilder,
    level: FemtoLevel,
    send_empty_entries: bool,
    flood: Mutex<FloodController>,
    transport: Arc<dyn MailTransport>,
    reporter: Arc<dyn ErrorReporter>,
    closed: AtomicBool,
}

impl FemtoMailHandler {
    /// Construct the handler from a configuration object and a transport.
    pub fn with_config(config: MailHandlerConfig, transport: Arc<dyn MailTransport>) -> Self {
        let builder = MessageBuilder::new(config.message).with_flood_level(config.flood_level);
        Self {
            builder,
            level: config.level,
            send_empty_entries: config.send_empty_entries,
            flood: Mutex::new(FloodController::new(config.flood_level)),
            transport,
            reporter: Arc::new(LogErrorReporter),
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the error reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Mail `record` if the level, content and flood state allow it.
    ///
    /// Always returns normally.
    pub fn emit(&self, record: &FemtoLogRecord) {
        if record.level < self.level {
            return;
        }
        let record = record.to_rendered();
        if !self.send_empty_entries && record.message().trim().is_empty() {
            return;
        }

        let verdict = self
            .flood
            .lock()
            .decide(record.local_time());
        let kind = match verdict {
            Verdict::Suppress => return,
            Verdict::Send => MessageKind::Normal,
            Verdict::SendFinalNotice => MessageKind::FinalNotice,
        };

        let message = self.builder.build(&record, kind);
        if let Err(err) = self.deliver(&message) {
            self.reporter.report(HANDLER_NAME, &err);
        }
    }

    fn deliver(&self, message: &EmailMessage) -> Result<(), HandlerError> {
        let config = self.builder.config();
        self.transport
            .send(&config.from, &config.to, &message.to_bytes())?;
        Ok(())
    }

    /// Snapshot of the flood counters for the current day.
    pub fn flood_state(&self) -> Option<FloodState> {
        self.flood.lock().state().copied()
    }

    /// Stop accepting records through [`FemtoHandlerTrait::handle`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FemtoHandlerTrait for FemtoMailHandler {
    fn handle(&self, record: FemtoLogRecord) -> Result<(), HandlerError> {
        if self.is_closed() {
            return Err(HandlerError::Closed);
        }
        self.emit(&record);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for FemtoMailHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.builder.config();
        f.debug_struct("FemtoMailHandler")
            .field("from", &config.from)
            .field("to", &config.to)
            .field("level", &self.level)
            .field("flood", &*self.flood.lock())
            .finish_non_exhaustive()
    }
}
