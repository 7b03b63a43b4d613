//! Named-placeholder templates for subjects, bodies and formatters.
//!
//! Templates reference record attributes by name, e.g.
//! `"{asctime} [{levelname}] {line}"`. The attribute set is fixed (see
//! [`TemplateField`]). `{{` and `}}` produce literal braces; a placeholder that
//! does not name a known attribute, or is never closed, is kept verbatim so a
//! template can never fail to render.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use crate::log_record::{FemtoLogRecord, local_datetime};

/// `strftime` pattern used for `{asctime}`.
pub const ASCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Record attributes available to templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateField {
    /// Record time as `YYYY-MM-DD HH:MM:SS,mmm` in local time.
    AscTime,
    /// Upper-case level name.
    LevelName,
    /// First line of the message.
    Line,
    /// Full message text.
    Message,
    /// Logger name.
    Name,
    /// Module path of the call site.
    Module,
    /// Source file of the call site.
    Filename,
    /// Source line of the call site.
    LineNo,
    /// Name of the emitting thread, or its id when unnamed.
    Thread,
}

impl FromStr for TemplateField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asctime" => Ok(Self::AscTime),
            "levelname" => Ok(Self::LevelName),
            "line" => Ok(Self::Line),
            "message" => Ok(Self::Message),
            "name" => Ok(Self::Name),
            "module" => Ok(Self::Module),
            "filename" => Ok(Self::Filename),
            "lineno" => Ok(Self::LineNo),
            "thread" => Ok(Self::Thread),
            _ => Err(()),
        }
    }
}

/// Format `timestamp` the way `{asctime}` renders it.
pub fn format_asctime(timestamp: SystemTime) -> String {
    local_datetime(timestamp)
        .format(ASCTIME_FORMAT)
        .to_string()
}

/// Attribute values resolved from a record.
///
/// The message can be overridden so body templates see formatter output
/// rather than the raw record message.
pub struct RecordFields<'a> {
    record: &'a FemtoLogRecord,
    message: Cow<'a, str>,
}

impl<'a> RecordFields<'a> {
    /// Resolve fields from `record` using its own message.
    pub fn new(record: &'a FemtoLogRecord) -> Self {
        Self {
            record,
            message: record.message(),
        }
    }

    /// Resolve fields from `record`, substituting `message` for `{message}`
    /// and `{line}`.
    pub fn with_message(record: &'a FemtoLogRecord, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            record,
            message: message.into(),
        }
    }

    fn value(&self, field: TemplateField) -> Cow<'_, str> {
        let metadata = &self.record.metadata;
        match field {
            TemplateField::AscTime => Cow::Owned(format_asctime(metadata.timestamp)),
            TemplateField::LevelName => Cow::Borrowed(self.record.level_str()),
            TemplateField::Line => Cow::Borrowed(self.message.lines().next().unwrap_or("")),
            TemplateField::Message => Cow::Borrowed(&self.message),
            TemplateField::Name => Cow::Borrowed(self.record.logger()),
            TemplateField::Module => Cow::Borrowed(&metadata.module_path),
            TemplateField::Filename => Cow::Borrowed(&metadata.filename),
            TemplateField::LineNo => Cow::Owned(metadata.line_number.to_string()),
            TemplateField::Thread => match &metadata.thread_name {
                Some(name) => Cow::Borrowed(name),
                None => Cow::Owned(format!("{:?}", metadata.thread_id)),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(TemplateField),
}

/// A parsed template.
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`. Parsing never fails; see the module docs.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find(['{', '}']) {
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if tail.starts_with("{{") {
                literal.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                literal.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('}') {
                literal.push('}');
                rest = &tail[1..];
            } else {
                let field = tail[1..]
                    .find('}')
                    .and_then(|end| Some((end, tail[1..=end].parse::<TemplateField>().ok()?)));
                match field {
                    Some((end, field)) => {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Field(field));
                        rest = &tail[end + 2..];
                    }
                    None => {
                        literal.push('{');
                        rest = &tail[1..];
                    }
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_owned(),
            segments,
        }
    }

    /// Original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template references `field`.
    pub fn uses(&self, field: TemplateField) -> bool {
        self.segments.contains(&Segment::Field(field))
    }

    /// Substitute `fields` into the template.
    pub fn render(&self, fields: &RecordFields<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&fields.value(*field)),
            }
        }
        out
    }

    /// Render the template against `record`.
    pub fn render_record(&self, record: &FemtoLogRecord) -> String {
        self.render(&RecordFields::new(record))
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.source).finish()
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Self::parse(&source)
    }
}
