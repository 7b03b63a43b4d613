//! Transport that records messages instead of delivering them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::transport::{MailTransport, TransportError};

/// One captured delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMail {
    pub from: String,
    pub to: Vec<String>,
    /// Raw message bytes as the handler produced them.
    pub data: Vec<u8>,
}

impl SentMail {
    /// Message as text. Handlers only produce ASCII output.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Value of the first header called `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<String> {
        let text = self.text();
        let (head, _) = text.split_once("\r\n\r\n")?;
        let mut value: Option<String> = None;
        for line in head.split("\r\n") {
            if let Some(current) = value.as_mut() {
                match line.strip_prefix(' ') {
                    Some(rest) => {
                        current.push(' ');
                        current.push_str(rest);
                        continue;
                    }
                    None => break,
                }
            }
            match line.split_once(':') {
                Some((key, rest)) if key.eq_ignore_ascii_case(name) => {
                    value = Some(rest.trim_start().to_owned());
                }
                _ => {}
            }
        }
        value
    }

    /// Everything after the blank line separating headers from the body.
    pub fn body(&self) -> String {
        let text = self.text();
        text.split_once("\r\n\r\n")
            .map(|(_, body)| body.to_owned())
            .unwrap_or_default()
    }
}

/// Records every message handed to it. Can be switched to fail.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMail>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with [`TransportError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the captured messages, oldest first.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, from: &str, to: &[String], message: &[u8]) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "recording transport set to fail".into(),
            ));
        }
        self.sent.lock().push(SentMail {
            from: from.to_owned(),
            to: to.to_vec(),
            data: message.to_vec(),
        });
        Ok(())
    }
}
