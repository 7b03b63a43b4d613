//! Handler that collects records and mails them as a single digest.
//!
//! Useful for batch jobs: attach a [`FemtoSummarisingHandler`] for the
//! duration of a run and everything logged is sent in one message when the
//! handler is flushed, closed or dropped. The subject reports the most severe
//! level seen.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::{
    error_reporter::{ErrorReporter, LogErrorReporter},
    handler::{FemtoHandlerTrait, HandlerError},
    level::FemtoLevel,
    log_record::FemtoLogRecord,
    mail_handler::{MessageBuilder, SummarisingHandlerConfig},
    transport::MailTransport,
};

const HANDLER_NAME: &str = "FemtoSummarisingHandler";

#[derive(Default)]
struct Digest {
    lines: Vec<String>,
    highest: Option<FemtoLevel>,
}

impl Digest {
    fn push(&mut self, level: FemtoLevel, line: String) {
        self.lines.push(line);
        self.highest = self.highest.max(Some(level));
    }

    fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Buffers formatted records and sends them as one message on flush.
pub struct FemtoSummarisingHandler {
    builder: MessageBuilder,
    level: FemtoLevel,
    send_empty_entries: bool,
    digest: Mutex<Digest>,
    transport: Arc<dyn MailTransport>,
    reporter: Arc<dyn ErrorReporter>,
    closed: AtomicBool,
}

impl FemtoSummarisingHandler {
    pub fn with_config(
        config: SummarisingHandlerConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            builder: MessageBuilder::new(config.message),
            level: config.level,
            send_empty_entries: config.send_empty_entries,
            digest: Mutex::new(Digest::default()),
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

    /// Format `record` and add it to the digest.
    pub fn emit(&self, record: &FemtoLogRecord) {
        if record.level < self.level {
            return;
        }
        let line = self.builder.config().formatter.format(record);
        self.digest.lock().push(record.level, line);
    }

    /// Number of records waiting to be sent.
    pub fn pending(&self) -> usize {
        self.digest.lock().lines.len()
    }

    /// Send the digest, if there is one, and start a new one.
    ///
    /// Returns `false` when delivery failed; the failure is also passed to
    /// the error reporter.
    pub fn send_summary(&self) -> bool {
        let digest = self.digest.lock().take();
        if digest.lines.is_empty() && !self.send_empty_entries {
            return true;
        }
        let level = digest.highest.unwrap_or(self.level);
        let summary = FemtoLogRecord::new(HANDLER_NAME, level, &digest.lines.join("\n"));
        let message = self.builder.build_summary(&summary);
        let config = self.builder.config();
        match self
            .transport
            .send(&config.from, &config.to, &message.to_bytes())
        {
            Ok(()) => true,
            Err(err) => {
                self.reporter.report(HANDLER_NAME, &HandlerError::from(err));
                false
            }
        }
    }

    /// Send what is buffered and stop accepting records.
    ///
    /// Only the first call sends anything.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.send_summary();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FemtoHandlerTrait for FemtoSummarisingHandler {
    fn handle(&self, record: FemtoLogRecord) -> Result<(), HandlerError> {
        if self.is_closed() {
            return Err(HandlerError::Closed);
        }
        self.emit(&record);
        Ok(())
    }

    fn flush(&self) -> bool {
        self.send_summary()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for FemtoSummarisingHandler {
    fn drop(&mut self) {
        self.close();
    }
}
