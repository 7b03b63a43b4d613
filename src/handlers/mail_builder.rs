//! Builder for [`FemtoMailHandler`](crate::mail_handler::FemtoMailHandler).
//!
//! Collects sender, recipients, templates, charset, custom headers, flood
//! level and delivery settings, validates them, and builds the handler with
//! either an SMTP transport or one supplied by the caller.

use super::builder_macros::common_setters;
use super::common::CommonBuilder;
use super::{ConfigurationError, HandlerBuilderTrait};
use crate::{
    formatter::{SharedFormatter, TemplateFormatter},
    mail_handler::{DEFAULT_FLOOD_LEVEL, DEFAULT_SUBJECT, FemtoMailHandler, MailHandlerConfig},
};

/// Builder for constructing [`FemtoMailHandler`] instances.
#[derive(Clone, Debug)]
pub struct MailHandlerBuilder {
    common: CommonBuilder,
    flood_level: Option<u32>,
}

impl Default for MailHandlerBuilder {
    fn default() -> Self {
        Self {
            common: CommonBuilder::default(),
            flood_level: Some(DEFAULT_FLOOD_LEVEL),
        }
    }
}

common_setters!(MailHandlerBuilder);

impl MailHandlerBuilder {
    /// Create a builder with the default flood level of 10 mails a day.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of mails sent per day before flood protection
    /// engages; `None` removes the limit.
    pub fn with_flood_level(mut self, flood_level: Option<u32>) -> Self {
        self.flood_level = flood_level;
        self
    }

    /// Validate the builder and produce the handler configuration.
    pub fn build_config(&self) -> Result<MailHandlerConfig, ConfigurationError> {
        let message = self.common.message_config(DEFAULT_SUBJECT, || {
            SharedFormatter::new(TemplateFormatter::message_only())
        })?;
        Ok(MailHandlerConfig {
            message,
            flood_level: self.flood_level,
            level: self.common.level(),
            send_empty_entries: self.common.send_empty_entries,
        })
    }
}

impl HandlerBuilderTrait for MailHandlerBuilder {
    type Handler = FemtoMailHandler;

    fn build_inner(&self) -> Result<FemtoMailHandler, ConfigurationError> {
        let config = self.build_config()?;
        let transport = self.common.transport()?;
        Ok(FemtoMailHandler::with_config(config, transport).with_reporter(self.common.reporter()))
    }
}
