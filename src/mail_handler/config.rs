//! Configuration structures consumed by the mail handlers.
//!
//! `MailHandlerBuilder` and `SummarisingHandlerBuilder` validate user input
//! and produce these values; the handlers take them as given.

use crate::formatter::SharedFormatter;
use crate::level::FemtoLevel;
use crate::template::Template;

use super::encoding::Charset;

/// Messages allowed per day when the caller does not choose a flood level.
pub const DEFAULT_FLOOD_LEVEL: u32 = 10;
/// Default subject: the first line of the message.
pub const DEFAULT_SUBJECT: &str = "{line}";
/// Default body template: the formatted record as is.
pub const DEFAULT_TEMPLATE: &str = "{message}";
/// Default charset for message bodies.
pub const DEFAULT_CHARSET: &str = "utf-8";
/// Default content type. Only the subtype is used.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";
/// Default subject of summary mails.
pub const DEFAULT_SUMMARY_SUBJECT: &str = "Summary of Log Messages ({levelname})";
/// Default per-record line format in summary mails.
pub const DEFAULT_SUMMARY_FORMAT: &str = "{asctime} - {levelname} - {message}";

/// Everything needed to turn a record into an email.
#[derive(Clone, Debug)]
pub struct MessageConfig {
    /// Envelope sender and `From` header.
    pub from: String,
    /// Envelope recipients and `To` header, in order.
    pub to: Vec<String>,
    pub subject: Template,
    /// Body template; `{message}` is the formatter output.
    pub template: Template,
    pub charset: Charset,
    /// Subtype of the `text/*` content type.
    pub content_subtype: String,
    /// Extra headers appended after the generated ones, verbatim.
    pub headers: Vec<(String, String)>,
    pub formatter: SharedFormatter,
}

/// Configuration of a [`FemtoMailHandler`](super::FemtoMailHandler).
#[derive(Clone, Debug)]
pub struct MailHandlerConfig {
    pub message: MessageConfig,
    /// Messages per day before flood protection engages; `None` is unlimited.
    pub flood_level: Option<u32>,
    /// Records below this level are ignored.
    pub level: FemtoLevel,
    /// Send records whose message is blank.
    pub send_empty_entries: bool,
}

/// Configuration of a [`FemtoSummarisingHandler`](crate::summarising_handler::FemtoSummarisingHandler).
#[derive(Clone, Debug)]
pub struct SummarisingHandlerConfig {
    pub message: MessageConfig,
    pub level: FemtoLevel,
    /// Send a summary even when nothing was buffered.
    pub send_empty_entries: bool,
}
