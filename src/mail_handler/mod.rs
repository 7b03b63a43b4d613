//! Email logging handler with flood protection.
//!
//! This module defines [`FemtoMailHandler`], a handler that renders each
//! [`FemtoLogRecord`](crate::log_record::FemtoLogRecord) as a MIME message
//! and hands it to a [`MailTransport`](crate::transport::MailTransport).
//!
//! # Flood Protection
//!
//! The handler counts messages per local calendar day. With a flood level of
//! `N` the first `N` records of a day are mailed, the next one is replaced by
//! a "Too Many Log Entries" notice, and everything after that is dropped
//! until midnight. A flood level of `None` disables the limit.
//!
//! # Encoding
//!
//! Bodies are encoded in the configured charset. ASCII bodies are sent as
//! `7bit`; single-byte Western charsets use `quoted-printable` and anything
//! else `base64`. Non-ASCII subjects are sent as RFC 2047 encoded words in
//! UTF-8.

mod config;
mod encoding;
mod flood;
mod handler;
mod message;

#[cfg(test)]
mod tests;

pub use config::{
    DEFAULT_CHARSET, DEFAULT_CONTENT_TYPE, DEFAULT_FLOOD_LEVEL, DEFAULT_SUBJECT,
    DEFAULT_SUMMARY_FORMAT, DEFAULT_SUMMARY_SUBJECT, DEFAULT_TEMPLATE, MailHandlerConfig,
    MessageConfig, SummarisingHandlerConfig,
};
pub use encoding::{Charset, EncodedBody, TransferEncoding};
pub use flood::{FloodController, FloodState, Verdict};
pub use handler::FemtoMailHandler;
pub use message::{EmailMessage, FLOOD_LOGGER, FLOOD_SUBJECT, MessageBuilder, MessageKind, X_MAILER};
