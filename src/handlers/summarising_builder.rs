//! Builder for
//! [`FemtoSummarisingHandler`](crate::summarising_handler::FemtoSummarisingHandler).

use super::builder_macros::common_setters;
use super::common::CommonBuilder;
use super::{ConfigurationError, HandlerBuilderTrait};
use crate::{
    formatter::{SharedFormatter, TemplateFormatter},
    mail_handler::{DEFAULT_SUMMARY_FORMAT, DEFAULT_SUMMARY_SUBJECT, SummarisingHandlerConfig},
    summarising_handler::FemtoSummarisingHandler,
};

/// Builder for constructing [`FemtoSummarisingHandler`] instances.
///
/// The subject defaults to `Summary of Log Messages ({levelname})`, where
/// `{levelname}` is the most severe level in the digest, and each record is
/// formatted as `{asctime} - {levelname} - {message}`.
#[derive(Clone, Debug, Default)]
pub struct SummarisingHandlerBuilder {
    common: CommonBuilder,
}

common_setters!(SummarisingHandlerBuilder);

impl SummarisingHandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the builder and produce the handler configuration.
    pub fn build_config(&self) -> Result<SummarisingHandlerConfig, ConfigurationError> {
        let message = self.common.message_config(DEFAULT_SUMMARY_SUBJECT, || {
            SharedFormatter::new(TemplateFormatter::new(DEFAULT_SUMMARY_FORMAT))
        })?;
        Ok(SummarisingHandlerConfig {
            message,
            level: self.common.level(),
            send_empty_entries: self.common.send_empty_entries,
        })
    }
}

impl HandlerBuilderTrait for SummarisingHandlerBuilder {
    type Handler = FemtoSummarisingHandler;

    fn build_inner(&self) -> Result<FemtoSummarisingHandler, ConfigurationError> {
        let config = self.build_config()?;
        let transport = self.common.transport()?;
        Ok(FemtoSummarisingHandler::with_config(config, transport)
            .with_reporter(self.common.reporter()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::level::FemtoLevel;
    use crate::log_record::FemtoLogRecord;
    use crate::test_utils::RecordingTransport;

    #[test]
    fn summary_defaults() {
        let config = SummarisingHandlerBuilder::new()
            .with_from("batch@example.com")
            .with_to("ops@example.com")
            .build_config()
            .expect("valid configuration");
        assert_eq!(config.message.subject.source(), DEFAULT_SUMMARY_SUBJECT);
        assert!(!config.send_empty_entries);
    }

    #[test]
    fn built_handler_sends_digest_on_close() {
        let transport = RecordingTransport::new();
        let handler = SummarisingHandlerBuilder::new()
            .with_from("batch@example.com")
            .with_recipients(["ops@example.com", "dev@example.com"])
            .with_level(FemtoLevel::Warn)
            .with_transport(Arc::new(transport.clone()))
            .build_inner()
            .expect("handler builds");

        handler.emit(&FemtoLogRecord::new("job", FemtoLevel::Info, "noise"));
        handler.emit(&FemtoLogRecord::new("job", FemtoLevel::Critical, "meltdown"));
        handler.close();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ops@example.com", "dev@example.com"]);
        assert_eq!(
            sent[0].header("Subject").as_deref(),
            Some("Summary of Log Messages (CRITICAL)")
        );
        let body = sent[0].body();
        assert!(body.ends_with(" - CRITICAL - meltdown"), "{body}");
        assert!(!body.contains("noise"));
    }

    #[test]
    fn missing_sender_is_rejected() {
        assert!(matches!(
            SummarisingHandlerBuilder::new()
                .with_to("ops@example.com")
                .build_inner(),
            Err(ConfigurationError::InvalidConfig(_))
        ));
    }
}
