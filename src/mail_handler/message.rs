//! Rendering of log records into MIME messages.

use std::fmt;

use chrono::{DateTime, Local};

use crate::level::FemtoLevel;
use crate::log_record::FemtoLogRecord;
use crate::template::RecordFields;

use super::config::MessageConfig;
use super::encoding::{EncodedBody, encode_words, sanitize_header_value};

/// Subject of the final notice, also the first line of its body.
pub const FLOOD_SUBJECT: &str = "Too Many Log Entries";
/// Logger name attached to the synthetic final-notice record.
pub const FLOOD_LOGGER: &str = "flood";
/// Value of the `X-Mailer` header.
pub const X_MAILER: &str = concat!("femtomail ", env!("CARGO_PKG_VERSION"));

const RFC2822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Which message to build for a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// The record itself.
    Normal,
    /// Notice that flood protection has engaged for the rest of the day.
    FinalNotice,
}

/// A rendered email, ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    headers: Vec<(String, String)>,
    subject: String,
    content_type: String,
    body: EncodedBody,
}

impl EmailMessage {
    /// All headers in output order. Names may repeat.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Values of every header named exactly `name` (case-sensitive).
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Subject before any RFC 2047 encoding.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `Content-Type` value, e.g. `text/plain; charset="utf-8"`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &EncodedBody {
        &self.body
    }

    /// The full message with CRLF line endings.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for EmailMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        f.write_str("\r\n")?;
        f.write_str(&self.body.content)
    }
}

/// Turns records into [`EmailMessage`]s according to a [`MessageConfig`].
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    config: MessageConfig,
    flood_level: Option<u32>,
}

impl MessageBuilder {
    pub fn new(config: MessageConfig) -> Self {
        Self {
            config,
            flood_level: None,
        }
    }

    /// Flood level quoted in the final notice.
    pub fn with_flood_level(mut self, flood_level: Option<u32>) -> Self {
        self.flood_level = flood_level;
        self
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }

    /// Render `record` as a message of the given kind. Never fails.
    pub fn build(&self, record: &FemtoLogRecord, kind: MessageKind) -> EmailMessage {
        match kind {
            MessageKind::Normal => {
                let subject = self.config.subject.render_record(record);
                self.assemble(record, subject, self.render_body(record))
            }
            MessageKind::FinalNotice => {
                let notice = self.final_notice_record(record);
                self.assemble(&notice, FLOOD_SUBJECT.to_owned(), self.render_body(&notice))
            }
        }
    }

    /// Render a digest whose body is the message of `summary`, taken as
    /// already formatted.
    pub fn build_summary(&self, summary: &FemtoLogRecord) -> EmailMessage {
        let subject = self.config.subject.render_record(summary);
        let body = self.config.template.render_record(summary);
        self.assemble(summary, subject, body)
    }

    fn render_body(&self, record: &FemtoLogRecord) -> String {
        let formatted = self.config.formatter.format(record);
        self.config
            .template
            .render(&RecordFields::with_message(record, formatted))
    }

    fn final_notice_record(&self, trigger: &FemtoLogRecord) -> FemtoLogRecord {
        let at = trigger.local_time();
        let text = flood_notice(self.flood_level.unwrap_or_default(), at);
        FemtoLogRecord::new(FLOOD_LOGGER, FemtoLevel::Critical, &text)
            .with_timestamp(trigger.timestamp())
    }

    fn assemble(&self, record: &FemtoLogRecord, subject: String, body_text: String) -> EmailMessage {
        let config = &self.config;
        let subject = sanitize_header_value(&subject);
        let body = config.charset.encode_body(&body_text);
        let plain_subject = subject.is_ascii() && body_text.is_ascii();
        let encoded_subject = if subject.is_empty() || plain_subject {
            subject.clone()
        } else {
            encode_words(&subject)
        };
        let content_type = format!(
            "text/{}; charset=\"{}\"",
            config.content_subtype, body.charset
        );
        let created = record.local_time();

        let mut headers = vec![
            ("MIME-Version".to_owned(), "1.0".to_owned()),
            ("Content-Type".to_owned(), content_type.clone()),
            (
                "Content-Transfer-Encoding".to_owned(),
                body.transfer_encoding.as_str().to_owned(),
            ),
            ("Subject".to_owned(), encoded_subject),
            ("From".to_owned(), sanitize_header_value(&config.from)),
            (
                "To".to_owned(),
                sanitize_header_value(&config.to.join(", ")),
            ),
            ("X-Mailer".to_owned(), X_MAILER.to_owned()),
            ("X-Log-Level".to_owned(), record.level_str().to_owned()),
            ("Date".to_owned(), created.format(RFC2822_FORMAT).to_string()),
            ("Message-ID".to_owned(), message_id(&config.from, created)),
        ];
        headers.extend(
            config
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), sanitize_header_value(value))),
        );

        EmailMessage {
            headers,
            subject,
            content_type,
            body,
        }
    }
}

fn flood_notice(flood_level: u32, at: DateTime<Local>) -> String {
    format!(
        "{FLOOD_SUBJECT}\n\
         \n\
         More than {flood_level} entries have been logged that would have resulted in\n\
         emails being sent.\n\
         \n\
         No further emails will be sent for log entries generated between\n\
         {} and midnight.\n\
         \n\
         Please consult any other configured logs, such as a file handler,\n\
         that may contain important entries that have not been emailed.\n",
        at.format("%H:%M:%S")
    )
}

fn message_id(from: &str, at: DateTime<Local>) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().trim_end_matches('>'))
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");
    format!(
        "<{}.{}.{:016x}@{}>",
        at.format("%Y%m%d%H%M%S"),
        std::process::id(),
        rand::random::<u64>(),
        domain
    )
}
