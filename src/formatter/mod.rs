//! Formatter implementations.
//!
//! Provides the core [`FemtoFormatter`] trait alongside a shared trait-object
//! wrapper and the two stock formatters: [`DefaultFormatter`] for
//! `name [LEVEL] message` lines and [`TemplateFormatter`] for anything
//! expressible with [`Template`] placeholders.

use std::{fmt, sync::Arc};

use crate::log_record::FemtoLogRecord;
use crate::template::Template;

/// Trait for formatting log records into strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// shared across threads in a logging system.
pub trait FemtoFormatter: Send + Sync {
    /// Format a log record into a string representation.
    fn format(&self, record: &FemtoLogRecord) -> String;
}

/// Shared formatter trait object used across handlers.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn FemtoFormatter + Send + Sync>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: FemtoFormatter + Send + Sync + 'static,
    {
        let inner: Arc<dyn FemtoFormatter + Send + Sync> = Arc::new(formatter);
        Self { inner }
    }

    /// Format a log record using the wrapped formatter instance.
    pub fn format(&self, record: &FemtoLogRecord) -> String {
        self.inner.format(record)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn FemtoFormatter>)")
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DefaultFormatter;

impl FemtoFormatter for DefaultFormatter {
    fn format(&self, record: &FemtoLogRecord) -> String {
        format!(
            "{} [{}] {}",
            record.logger(),
            record.level_str(),
            record.message()
        )
    }
}

/// Formatter rendering a [`Template`] against each record.
#[derive(Clone, Debug)]
pub struct TemplateFormatter {
    template: Template,
}

impl TemplateFormatter {
    pub fn new(template: impl Into<Template>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Formatter emitting only the message text.
    pub fn message_only() -> Self {
        Self::new("{message}")
    }
}

impl FemtoFormatter for TemplateFormatter {
    fn format(&self, record: &FemtoLogRecord) -> String {
        self.template.render_record(record)
    }
}

impl FemtoFormatter for SharedFormatter {
    fn format(&self, record: &FemtoLogRecord) -> String {
        self.inner.format(record)
    }
}

impl FemtoFormatter for Arc<dyn FemtoFormatter + Send + Sync> {
    fn format(&self, record: &FemtoLogRecord) -> String {
        (**self).format(record)
    }
}

impl FemtoFormatter for Box<dyn FemtoFormatter + Send + Sync> {
    fn format(&self, record: &FemtoLogRecord) -> String {
        (**self).format(record)
    }
}
