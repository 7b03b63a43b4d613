//! Log levels understood by loggers, handlers and templates.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FemtoLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

/// Returned when a string does not name a known level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FemtoLevel {
    /// Upper-case level name, as rendered by `{levelname}`.
    pub fn as_str(self) -> &'static str {
        match self {
            FemtoLevel::Trace => "TRACE",
            FemtoLevel::Debug => "DEBUG",
            FemtoLevel::Info => "INFO",
            FemtoLevel::Warn => "WARN",
            FemtoLevel::Error => "ERROR",
            FemtoLevel::Critical => "CRITICAL",
        }
    }

    /// Parse `s`, logging a warning and falling back to `Info` when unknown.
    pub fn parse_or_warn(s: &str) -> Self {
        s.parse().unwrap_or_else(|err: ParseLevelError| {
            log::warn!("{err}; defaulting to INFO");
            Self::Info
        })
    }
}

impl fmt::Display for FemtoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FemtoLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl From<FemtoLevel> for u8 {
    fn from(level: FemtoLevel) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for FemtoLevel {
    type Error = ParseLevelError;

    fn try_from(value: u8) -> Result<Self, ParseLevelError> {
        match value {
            0 => Ok(Self::Trace),
            1 => Ok(Self::Debug),
            2 => Ok(Self::Info),
            3 => Ok(Self::Warn),
            4 => Ok(Self::Error),
            5 => Ok(Self::Critical),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}
