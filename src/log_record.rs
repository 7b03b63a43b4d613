//! Log record representation for femtomail.
//!
//! This module defines the `FemtoLogRecord` struct that captures log events
//! along with their contextual metadata such as timestamps, source location,
//! and thread information. Messages may be plain text or any `Display`
//! value; the latter is rendered lazily and defensively so a misbehaving
//! `Display` implementation can never take the logging call down with it.

use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, Utc};

use crate::level::FemtoLevel;

/// Convert `timestamp` to local time.
///
/// Instants chrono cannot represent fall back to the current time.
pub fn local_datetime(timestamp: SystemTime) -> DateTime<Local> {
    let utc = match timestamp.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs())
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, after.subsec_nanos())),
        Err(err) => {
            let before = err.duration();
            let nanos = before.subsec_nanos();
            i64::try_from(before.as_secs())
                .ok()
                .and_then(|secs| match nanos {
                    0 => Some((secs.checked_neg()?, 0)),
                    _ => Some((secs.checked_neg()?.checked_sub(1)?, 1_000_000_000 - nanos)),
                })
                .and_then(|(secs, nanos)| DateTime::<Utc>::from_timestamp(secs, nanos))
        }
    };
    utc.map_or_else(Local::now, |utc| utc.with_timezone(&Local))
}

/// Additional context associated with a log record.
#[derive(Clone, Debug)]
pub struct RecordMetadata {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file name for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// ID of the thread that created the record.
    pub thread_id: ThreadId,
    /// Name of the thread that created the record (if any).
    pub thread_name: Option<String>,
}

impl RecordMetadata {
    /// Capture timestamp and thread info from the current execution context.
    fn capture_runtime() -> (SystemTime, ThreadId, Option<String>) {
        let current = thread::current();
        (
            SystemTime::now(),
            current.id(),
            current.name().map(ToString::to_string),
        )
    }
}

impl Default for RecordMetadata {
    fn default() -> Self {
        let (timestamp, thread_id, thread_name) = Self::capture_runtime();
        Self {
            module_path: String::new(),
            filename: String::new(),
            line_number: 0,
            timestamp,
            thread_id,
            thread_name,
        }
    }
}

/// Message carried by a record.
#[derive(Clone)]
pub enum MessagePayload {
    /// Already rendered text.
    Text(String),
    /// Arbitrary value rendered through its `Display` implementation.
    Object {
        value: Arc<dyn fmt::Display + Send + Sync>,
        type_name: &'static str,
    },
}

impl MessagePayload {
    /// Render the payload as text.
    ///
    /// Objects whose `Display` implementation reports an error or panics are
    /// replaced by `<unprintable TYPE>`.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Object { value, type_name } => Cow::Owned(render_display(&**value, type_name)),
        }
    }
}

impl fmt::Debug for MessagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Object { type_name, .. } => f
                .debug_struct("Object")
                .field("type_name", type_name)
                .finish_non_exhaustive(),
        }
    }
}

fn render_display(value: &(dyn fmt::Display + Send + Sync), type_name: &str) -> String {
    let mut out = String::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        fmt::write(&mut out, format_args!("{value}"))
    }));
    match outcome {
        Ok(Ok(())) => out,
        _ => format!("<unprintable {type_name}>"),
    }
}

#[derive(Clone, Debug)]
pub struct FemtoLogRecord {
    /// Name of the logger that created this record.
    pub logger: String,
    /// Severity of the record.
    pub level: FemtoLevel,
    /// The log message content.
    pub payload: MessagePayload,
    /// Contextual metadata for the record.
    pub metadata: RecordMetadata,
}

impl FemtoLogRecord {
    /// Construct a new log record from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: FemtoLevel, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            payload: MessagePayload::Text(message.to_owned()),
            metadata: RecordMetadata::default(),
        }
    }

    /// Construct a record whose message is an arbitrary `Display` value.
    pub fn from_display<T>(logger: &str, level: FemtoLevel, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self {
            logger: logger.to_owned(),
            level,
            payload: MessagePayload::Object {
                value: Arc::new(value),
                type_name: std::any::type_name::<T>(),
            },
            metadata: RecordMetadata::default(),
        }
    }

    /// Construct a log record with explicit source location and key-values.
    ///
    /// The timestamp and thread fields of `metadata` are refreshed from the
    /// calling context.
    pub fn with_metadata(
        logger: &str,
        level: FemtoLevel,
        message: &str,
        mut metadata: RecordMetadata,
    ) -> Self {
        let (timestamp, thread_id, thread_name) = RecordMetadata::capture_runtime();
        metadata.timestamp = timestamp;
        metadata.thread_id = thread_id;
        metadata.thread_name = thread_name;
        Self {
            logger: logger.to_owned(),
            level,
            payload: MessagePayload::Text(message.to_owned()),
            metadata,
        }
    }

    /// Override the creation time of the record.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.metadata.timestamp = timestamp;
        self
    }

    /// Name of the logger that produced the record.
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// Upper-case level name.
    pub fn level_str(&self) -> &'static str {
        self.level.as_str()
    }

    /// Rendered message text. Never fails.
    pub fn message(&self) -> Cow<'_, str> {
        self.payload.render()
    }

    /// Time the record was created.
    pub fn timestamp(&self) -> SystemTime {
        self.metadata.timestamp
    }

    /// Creation time in the local time zone. See [`local_datetime`].
    pub fn local_time(&self) -> DateTime<Local> {
        local_datetime(self.metadata.timestamp)
    }

    /// The record with its message rendered to text.
    ///
    /// Text records are borrowed as they are; object payloads are rendered
    /// once so later consumers see a single, stable string.
    pub fn to_rendered(&self) -> Cow<'_, Self> {
        match &self.payload {
            MessagePayload::Text(_) => Cow::Borrowed(self),
            MessagePayload::Object { .. } => {
                let mut rendered = self.clone();
                rendered.payload = MessagePayload::Text(self.payload.render().into_owned());
                Cow::Owned(rendered)
            }
        }
    }
}

impl fmt::Display for FemtoLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message())
    }
}
