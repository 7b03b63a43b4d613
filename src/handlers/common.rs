//! Shared builder options.
//!
//! Stores the message and delivery fields common to the mail and summarising
//! handler builders, and turns them into a validated [`MessageConfig`] and a
//! ready [`MailTransport`].

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use super::ConfigurationError;
use super::builder_macros::ensure_present;
use crate::{
    error_reporter::{ErrorReporter, LogErrorReporter},
    formatter::SharedFormatter,
    level::FemtoLevel,
    mail_handler::{
        Charset, DEFAULT_CHARSET, DEFAULT_CONTENT_TYPE, DEFAULT_TEMPLATE, MessageConfig,
    },
    template::Template,
    transport::{
        Credentials, DEFAULT_SMTP_PORT, DEFAULT_SMTP_TIMEOUT, MailTransport, SmtpConfig, SmtpTls,
        SmtpTransport, TlsOptions,
    },
};

/// How a builder-made SMTP transport secures its connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TlsMode {
    #[default]
    None,
    StartTls,
    Implicit,
}

impl FromStr for TlsMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "starttls" => Ok(Self::StartTls),
            "implicit" | "tls" | "smtps" => Ok(Self::Implicit),
            other => Err(ConfigurationError::InvalidConfig(format!(
                "unknown tls mode: {other}"
            ))),
        }
    }
}

/// Fields shared by the mail handler builders.
#[derive(Clone, Default)]
pub(crate) struct CommonBuilder {
    pub(crate) from: Option<String>,
    pub(crate) to: Vec<String>,
    pub(crate) subject: Option<String>,
    pub(crate) template: Option<String>,
    pub(crate) charset: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) formatter: Option<SharedFormatter>,
    pub(crate) level: Option<FemtoLevel>,
    pub(crate) send_empty_entries: bool,
    pub(crate) mailhost: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) tls: TlsMode,
    pub(crate) timeout: Option<Duration>,
    pub(crate) transport: Option<Arc<dyn MailTransport>>,
    pub(crate) reporter: Option<Arc<dyn ErrorReporter>>,
}

impl fmt::Debug for CommonBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonBuilder")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("template", &self.template)
            .field("charset", &self.charset)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("level", &self.level)
            .field("send_empty_entries", &self.send_empty_entries)
            .field("mailhost", &self.mailhost)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("transport", &self.transport.as_ref().map(|_| "<custom>"))
            .finish_non_exhaustive()
    }
}

impl CommonBuilder {
    /// Validate the message options and assemble a [`MessageConfig`].
    pub(crate) fn message_config(
        &self,
        default_subject: &str,
        default_formatter: impl FnOnce() -> SharedFormatter,
    ) -> Result<MessageConfig, ConfigurationError> {
        let from = ensure_present!(self.from, "from")?;
        reject_line_breaks("from", from)?;
        let to = self.recipients()?;
        let content_subtype = content_subtype(
            self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
        )?;
        let charset = self.charset()?;
        for (name, _) in &self.headers {
            validate_header_name(name)?;
        }

        Ok(MessageConfig {
            from: from.to_owned(),
            to,
            subject: Template::parse(self.subject.as_deref().unwrap_or(default_subject)),
            template: Template::parse(self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)),
            charset,
            content_subtype,
            headers: self.headers.clone(),
            formatter: self.formatter.clone().unwrap_or_else(default_formatter),
        })
    }

    pub(crate) fn level(&self) -> FemtoLevel {
        self.level.unwrap_or(FemtoLevel::Trace)
    }

    pub(crate) fn reporter(&self) -> Arc<dyn ErrorReporter> {
        self.reporter
            .clone()
            .unwrap_or_else(|| Arc::new(LogErrorReporter))
    }

    fn recipients(&self) -> Result<Vec<String>, ConfigurationError> {
        if self.to.is_empty() {
            return Err(ConfigurationError::InvalidConfig(
                "at least one recipient (to) is required".into(),
            ));
        }
        self.to
            .iter()
            .map(|address| {
                let address = address.trim();
                if address.is_empty() {
                    return Err(ConfigurationError::InvalidConfig(
                        "recipient addresses must not be empty".into(),
                    ));
                }
                reject_line_breaks("to", address)?;
                Ok(address.to_owned())
            })
            .collect()
    }

    fn charset(&self) -> Result<Charset, ConfigurationError> {
        let label = self.charset.as_deref().unwrap_or(DEFAULT_CHARSET);
        Charset::for_label(label).ok_or_else(|| {
            ConfigurationError::InvalidConfig(format!("unsupported charset: {label}"))
        })
    }

    /// The transport set explicitly, or an SMTP transport built from the
    /// mailhost settings.
    pub(crate) fn transport(&self) -> Result<Arc<dyn MailTransport>, ConfigurationError> {
        let credentials = match (&self.username, &self.password) {
            (None, None) => None,
            (Some(username), Some(password)) if !username.trim().is_empty() => {
                Some(Credentials {
                    username: username.clone(),
                    password: password.clone(),
                })
            }
            _ => {
                return Err(ConfigurationError::InvalidConfig(
                    "credentials need both a username and a password".into(),
                ));
            }
        };
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let host = match self.mailhost.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host.to_owned(),
            Some(_) => {
                return Err(ConfigurationError::InvalidConfig(
                    "mailhost must not be empty".into(),
                ));
            }
            None => "localhost".to_owned(),
        };
        let tls = match self.tls {
            TlsMode::None => SmtpTls::None,
            TlsMode::StartTls => SmtpTls::StartTls(TlsOptions::new(host.clone())),
            TlsMode::Implicit => SmtpTls::Implicit(TlsOptions::new(host.clone())),
        };
        let timeout = self.timeout.unwrap_or(DEFAULT_SMTP_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfig(
                "timeout must be greater than zero".into(),
            ));
        }
        Ok(Arc::new(SmtpTransport::new(SmtpConfig {
            host,
            port: self.port.unwrap_or(DEFAULT_SMTP_PORT),
            timeout,
            tls,
            credentials,
            ..SmtpConfig::default()
        })))
    }
}

fn reject_line_breaks(field: &str, value: &str) -> Result<(), ConfigurationError> {
    if value.contains(['\r', '\n']) {
        return Err(ConfigurationError::InvalidConfig(format!(
            "{field} must be a single line"
        )));
    }
    Ok(())
}

/// Extract the subtype of `content_type`; the primary type is ignored and
/// `text` is always used.
fn content_subtype(content_type: &str) -> Result<String, ConfigurationError> {
    let invalid = || {
        ConfigurationError::InvalidConfig(format!("invalid content type: {content_type:?}"))
    };
    let (_, subtype) = content_type.split_once('/').ok_or_else(invalid)?;
    let subtype = subtype.trim();
    if subtype.is_empty()
        || !subtype
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
    {
        return Err(invalid());
    }
    Ok(subtype.to_owned())
}

/// RFC 5322 field names: printable ASCII without `:`.
fn validate_header_name(name: &str) -> Result<(), ConfigurationError> {
    if name.is_empty() || !name.bytes().all(|b| (33..=126).contains(&b) && b != b':') {
        return Err(ConfigurationError::InvalidConfig(format!(
            "invalid header name: {name:?}"
        )));
    }
    Ok(())
}
