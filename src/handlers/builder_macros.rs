//! Macros for generating shared builder methods.
//!
//! The mail and summarising builders expose the same fluent API for the
//! message and delivery options they share. These macros keep the two in
//! sync by generating setters that store into the embedded `CommonBuilder`.

/// Reject a missing or blank string option.
macro_rules! ensure_present {
    ($value:expr, $field:expr) => {{
        match $value.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err($crate::handlers::ConfigurationError::InvalidConfig(format!(
                "{} must not be empty",
                $field
            ))),
        }
    }};
}

pub(crate) use ensure_present;

/// Generate the setters every mail builder shares.
///
/// The builder must have a `common: CommonBuilder` field.
///
/// ```ignore
/// #[derive(Clone, Debug, Default)]
/// struct ExampleBuilder {
///     common: CommonBuilder,
/// }
///
/// common_setters!(ExampleBuilder);
///
/// let builder = ExampleBuilder::default().with_from("me@example.com");
/// ```
macro_rules! common_setters {
    ($builder:ident) => {
        impl $builder {
            /// Set the envelope sender and `From` header (required).
            pub fn with_from(mut self, from: impl Into<String>) -> Self {
                self.common.from = Some(from.into());
                self
            }

            /// Add one recipient. At least one is required.
            pub fn with_to(mut self, address: impl Into<String>) -> Self {
                self.common.to.push(address.into());
                self
            }

            /// Replace the recipient list.
            pub fn with_recipients<I, S>(mut self, addresses: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.common.to = addresses.into_iter().map(Into::into).collect();
                self
            }

            /// Set the subject template.
            pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
                self.common.subject = Some(subject.into());
                self
            }

            /// Set the body template. `{message}` is the formatted record.
            pub fn with_template(mut self, template: impl Into<String>) -> Self {
                self.common.template = Some(template.into());
                self
            }

            /// Set the body charset, e.g. `utf-8` or `iso-8859-1`.
            pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
                self.common.charset = Some(charset.into());
                self
            }

            /// Set the content type.
            ///
            /// Only the subtype is honoured: `foo/bar` is sent as `text/bar`.
            pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
                self.common.content_type = Some(content_type.into());
                self
            }

            /// Append a custom header. Headers are kept in insertion order and
            /// may repeat names already generated by the handler.
            pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
                self.common.headers.push((name.into(), value.into()));
                self
            }

            /// Set the formatter producing `{message}` for the body.
            pub fn with_formatter<F>(mut self, formatter: F) -> Self
            where
                F: $crate::formatter::FemtoFormatter + 'static,
            {
                self.common.formatter = Some($crate::formatter::SharedFormatter::new(formatter));
                self
            }

            /// Ignore records below `level`.
            pub fn with_level(mut self, level: $crate::level::FemtoLevel) -> Self {
                self.common.level = Some(level);
                self
            }

            /// Send messages even when there is nothing to report.
            pub fn with_send_empty_entries(mut self, send: bool) -> Self {
                self.common.send_empty_entries = send;
                self
            }

            /// Set the SMTP host. Defaults to `localhost`.
            pub fn with_mailhost(mut self, host: impl Into<String>) -> Self {
                self.common.mailhost = Some(host.into());
                self
            }

            /// Set the SMTP port. Defaults to 25.
            pub fn with_port(mut self, port: u16) -> Self {
                self.common.port = Some(port);
                self
            }

            /// Authenticate with `AUTH PLAIN`.
            pub fn with_credentials(
                mut self,
                username: impl Into<String>,
                password: impl Into<String>,
            ) -> Self {
                self.common.username = Some(username.into());
                self.common.password = Some(password.into());
                self
            }

            /// Set the SMTP username; a password must be supplied too.
            pub fn with_username(mut self, username: impl Into<String>) -> Self {
                self.common.username = Some(username.into());
                self
            }

            /// Set the SMTP password; a username must be supplied too.
            pub fn with_password(mut self, password: impl Into<String>) -> Self {
                self.common.password = Some(password.into());
                self
            }

            /// Choose how the SMTP connection is secured.
            pub fn with_tls(mut self, tls: $crate::handlers::TlsMode) -> Self {
                self.common.tls = tls;
                self
            }

            /// Set the SMTP connect, read and write timeout.
            pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
                self.common.timeout = Some(timeout);
                self
            }

            /// Deliver through `transport` instead of SMTP.
            pub fn with_transport(
                mut self,
                transport: std::sync::Arc<dyn $crate::transport::MailTransport>,
            ) -> Self {
                self.common.transport = Some(transport);
                self
            }

            /// Route delivery failures to `reporter` instead of `log::error!`.
            pub fn with_reporter(
                mut self,
                reporter: std::sync::Arc<dyn $crate::error_reporter::ErrorReporter>,
            ) -> Self {
                self.common.reporter = Some(reporter);
                self
            }
        }
    };
}

pub(crate) use common_setters;
