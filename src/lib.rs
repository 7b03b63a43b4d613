//! Email logging handlers with flood protection.
//!
//! `femtomail` turns log records into email. [`FemtoMailHandler`] sends one
//! message per record and stops after a configurable number of messages per
//! day, sending a single "Too Many Log Entries" notice instead of flooding
//! the inbox. [`FemtoSummarisingHandler`] collects records and mails them as
//! one digest.
//!
//! Handlers attach to a [`FemtoLogger`], or receive records from the `log`
//! crate through [`FemtoLogAdapter`]:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use femtomail::{FemtoLogger, HandlerBuilderTrait, MailHandlerBuilder};
//!
//! # fn main() -> Result<(), femtomail::ConfigurationError> {
//! let handler = MailHandlerBuilder::new()
//!     .with_from("app@example.com")
//!     .with_to("ops@example.com")
//!     .with_subject("[{levelname}] {line}")
//!     .with_mailhost("smtp.example.com")
//!     .build_inner()?;
//!
//! let logger = FemtoLogger::new("app");
//! logger.add_handler(Arc::new(handler));
//! logger.error("disk full");
//! # Ok(())
//! # }
//! ```

pub mod error_reporter;
pub mod file_config;
pub mod formatter;
pub mod handler;
pub mod handlers;
pub mod level;
pub mod log_compat;
pub mod log_record;
pub mod logger;
pub mod mail_handler;
pub mod summarising_handler;
pub mod template;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use error_reporter::{ErrorReporter, LogErrorReporter};
pub use file_config::{
    load_ini_file, mail_handler_from_ini_file, mail_handler_from_ini_str,
    summarising_handler_from_ini_file,
};
pub use formatter::{DefaultFormatter, FemtoFormatter, SharedFormatter, TemplateFormatter};
pub use handler::{FemtoHandlerTrait, HandlerError};
pub use handlers::{
    ConfigurationError, HandlerBuilderTrait, MailHandlerBuilder, SummarisingHandlerBuilder,
    TlsMode,
};
pub use level::{FemtoLevel, ParseLevelError};
pub use log_compat::{FemtoLogAdapter, install};
pub use log_record::{FemtoLogRecord, MessagePayload, RecordMetadata};
pub use logger::FemtoLogger;
pub use mail_handler::{
    EmailMessage, FemtoMailHandler, FloodController, FloodState, MailHandlerConfig,
    MessageBuilder, MessageConfig, MessageKind, SummarisingHandlerConfig, Verdict,
};
pub use summarising_handler::FemtoSummarisingHandler;
pub use template::{Template, TemplateField};
pub use transport::{
    Credentials, MailTransport, SmtpConfig, SmtpTls, SmtpTransport, TlsOptions, TransportError,
};
