//! INI configuration for the mail handlers.
//!
//! Parsing is delegated to the `rust-ini` crate; files are decoded with
//! `encoding_rs` first so that non-UTF-8 configuration files work. A section
//! describes one handler:
//!
//! ```ini
//! [mail]
//! from = app@example.com
//! to = ops@example.com, dev@example.com
//! subject = [{levelname}] {line}
//! flood_level = 5
//! mailhost = smtp.example.com:587
//! tls = starttls
//! username = app
//! password = secret
//! header.X-Environment = production
//! ```
//!
//! Unknown keys are ignored with a warning. Values that cannot be parsed are
//! reported as [`ConfigurationError::InvalidConfig`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use encoding_rs::Encoding;
use ini::{Ini, Properties};
use log::warn;

use crate::handlers::{
    ConfigurationError, MailHandlerBuilder, SummarisingHandlerBuilder, TlsMode,
};
use crate::level::FemtoLevel;

const HEADER_PREFIX: &str = "header.";

/// Build a [`MailHandlerBuilder`] from `section` of the INI file at `path`.
///
/// The file is decoded as UTF-8.
pub fn mail_handler_from_ini_file(
    path: impl AsRef<Path>,
    section: &str,
) -> Result<MailHandlerBuilder, ConfigurationError> {
    let ini = load_ini_file(path.as_ref(), None)?;
    mail_handler_from_ini(&ini, section)
}

/// Build a [`MailHandlerBuilder`] from `section` of INI text.
pub fn mail_handler_from_ini_str(
    text: &str,
    section: &str,
) -> Result<MailHandlerBuilder, ConfigurationError> {
    mail_handler_from_ini(&parse_ini(text)?, section)
}

/// Build a [`SummarisingHandlerBuilder`] from `section` of the INI file at
/// `path`. `flood_level` is not accepted in summary sections.
pub fn summarising_handler_from_ini_file(
    path: impl AsRef<Path>,
    section: &str,
) -> Result<SummarisingHandlerBuilder, ConfigurationError> {
    let ini = load_ini_file(path.as_ref(), None)?;
    summarising_handler_from_ini(&ini, section)
}

/// Read and parse an INI file, decoding it with the charset `encoding`
/// (UTF-8 when `None`).
pub fn load_ini_file(path: &Path, encoding: Option<&str>) -> Result<Ini, ConfigurationError> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(ConfigurationError::Ini(format!(
            "{} is an empty file",
            path.display()
        )));
    }
    let text = decode_contents(&bytes, encoding.unwrap_or("utf-8"))?;
    parse_ini(&text).map_err(|err| match err {
        ConfigurationError::Ini(msg) => {
            ConfigurationError::Ini(format!("{} is invalid: {msg}", path.display()))
        }
        other => other,
    })
}

fn decode_contents(bytes: &[u8], label: &str) -> Result<String, ConfigurationError> {
    let encoding = Encoding::for_label(label.trim().to_ascii_lowercase().as_bytes())
        .ok_or_else(|| ConfigurationError::InvalidConfig(format!("unknown encoding {label}")))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigurationError::Ini(format!(
            "file is not valid {}",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}

fn parse_ini(text: &str) -> Result<Ini, ConfigurationError> {
    Ini::load_from_str(text).map_err(|err| ConfigurationError::Ini(err.to_string()))
}

fn find_section<'a>(ini: &'a Ini, section: &str) -> Result<&'a Properties, ConfigurationError> {
    ini.section(Some(section))
        .ok_or_else(|| ConfigurationError::Ini(format!("no section [{section}]")))
}

/// Apply a key shared by both builders, warning about unknown keys.
macro_rules! apply_common {
    ($builder:expr, $section:expr, $key:expr, $value:expr) => {{
        let builder = $builder;
        let value: &str = $value;
        match $key {
            "from" => builder.with_from(value.trim()),
            "to" => builder.with_recipients(split_addresses(value)),
            "subject" => builder.with_subject(value),
            "template" => builder.with_template(value),
            "charset" => builder.with_charset(value.trim()),
            "content_type" => builder.with_content_type(value.trim()),
            "level" => builder.with_level(parse_level(value)?),
            "send_empty_entries" => builder.with_send_empty_entries(parse_bool($key, value)?),
            "mailhost" => {
                let (host, port) = parse_mailhost(value)?;
                let builder = builder.with_mailhost(host);
                match port {
                    Some(port) => builder.with_port(port),
                    None => builder,
                }
            }
            "username" => builder.with_username(value),
            "password" => builder.with_password(value),
            "tls" => builder.with_tls(value.parse::<TlsMode>()?),
            "timeout" => builder.with_timeout(parse_timeout(value)?),
            key => match key.strip_prefix(HEADER_PREFIX) {
                Some(name) => builder.with_header(name, value),
                None => {
                    warn!("ignoring unknown key {key:?} in section [{}]", $section);
                    builder
                }
            },
        }
    }};
}

fn mail_handler_from_ini(
    ini: &Ini,
    section: &str,
) -> Result<MailHandlerBuilder, ConfigurationError> {
    let mut builder = MailHandlerBuilder::new();
    for (key, value) in find_section(ini, section)?.iter() {
        builder = match key {
            "flood_level" => builder.with_flood_level(parse_flood_level(value)?),
            _ => apply_common!(builder, section, key, value),
        };
    }
    Ok(builder)
}

fn summarising_handler_from_ini(
    ini: &Ini,
    section: &str,
) -> Result<SummarisingHandlerBuilder, ConfigurationError> {
    let mut builder = SummarisingHandlerBuilder::new();
    for (key, value) in find_section(ini, section)?.iter() {
        builder = apply_common!(builder, section, key, value);
    }
    Ok(builder)
}

fn split_addresses(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_flood_level(value: &str) -> Result<Option<u32>, ConfigurationError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("unlimited") || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value.parse::<u32>().map(Some).map_err(|_| {
        ConfigurationError::InvalidConfig(format!(
            "flood_level must be a non-negative integer or 'unlimited', got {value:?}"
        ))
    })
}

fn parse_level(value: &str) -> Result<FemtoLevel, ConfigurationError> {
    value
        .parse::<FemtoLevel>()
        .map_err(|err| ConfigurationError::InvalidConfig(err.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigurationError::InvalidConfig(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}

fn parse_mailhost(value: &str) -> Result<(String, Option<u16>), ConfigurationError> {
    let value = value.trim();
    match value.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            let port = port.trim().parse::<u16>().map_err(|_| {
                ConfigurationError::InvalidConfig(format!("invalid mailhost port in {value:?}"))
            })?;
            Ok((host.trim().to_owned(), Some(port)))
        }
        _ => Ok((value.to_owned(), None)),
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigurationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| *seconds > 0.0)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .ok_or_else(|| {
            ConfigurationError::InvalidConfig(format!(
                "timeout must be a positive number of seconds, got {value:?}"
            ))
        })
}
