//! Mail transports.
//!
//! The handlers hand every finished message to a [`MailTransport`]. The crate
//! ships [`SmtpTransport`], a blocking SMTP client with optional TLS and
//! `AUTH PLAIN`; tests substitute the recording transport from
//! `test_utils`. A transport reports failures as [`TransportError`] and never
//! panics; the handlers decide what to do with the error.

mod connection;
mod smtp;


use std::io;
use std::sync::Arc;

use thiserror::Error;

pub use connection::TlsOptions;
pub use smtp::{
    Credentials, DEFAULT_SMTP_PORT, DEFAULT_SMTP_TIMEOUT, SmtpConfig, SmtpTls, SmtpTransport,
};

/// Errors raised while delivering a message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket-level failure (connect, read, write, timeout).
    #[error("I/O error talking to mail server: {0}")]
    Io(#[from] io::Error),
    /// TLS negotiation failed.
    #[error("TLS error: {0}")]
    Tls(String),
    /// The server answered a command with an unexpected reply code.
    #[error("server rejected {command}: {code} {message}")]
    Rejected {
        command: String,
        code: u16,
        message: String,
    },
    /// The server spoke something other than SMTP.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The transport cannot deliver at all (e.g. disabled in tests).
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous message delivery.
///
/// `message` is a complete RFC 5322 message with CRLF line endings;
/// `from` and `to` form the envelope.
pub trait MailTransport: Send + Sync {
    /// Deliver `message` from `from` to every address in `to`.
    fn send(&self, from: &str, to: &[String], message: &[u8]) -> Result<(), TransportError>;
}

impl<T: MailTransport + ?Sized> MailTransport for Arc<T> {
    fn send(&self, from: &str, to: &[String], message: &[u8]) -> Result<(), TransportError> {
        (**self).send(from, to, message)
    }
}

impl<T: MailTransport + ?Sized> MailTransport for Box<T> {
    fn send(&self, from: &str, to: &[String], message: &[u8]) -> Result<(), TransportError> {
        (**self).send(from, to, message)
    }
}
