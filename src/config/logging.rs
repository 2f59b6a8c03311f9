//! Logging configuration types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults::default_log_format;

/// Logging configuration. Logs always go to stdout, captured by whatever
/// supervises the process; there is no file-rotation layer.
#[derive(Debug, Serialize, Clone)]
pub struct LoggingConfig {
    /// Optional tracing level; read from JSON as a string and converted to enum.
    #[serde(default)]
    pub level: Option<LogLevel>,
    /// Format for rendered logs.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl<'de> Deserialize<'de> for LoggingConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct LoggingConfigHelper {
            #[serde(default)]
            level: Option<serde_json::Value>,
            #[serde(default = "default_log_format")]
            format: LogFormat,
        }

        let helper = LoggingConfigHelper::deserialize(deserializer)?;

        let level = helper.level.and_then(|value| {
            if let Some(level_str) = value.as_str() {
                parse_level(level_str)
            } else if let Some(arr) = value.as_array() {
                arr.first().and_then(|v| v.as_str()).and_then(parse_level)
            } else {
                None
            }
        });

        Ok(Self {
            level,
            format: helper.format,
        })
    }
}

fn parse_level(raw: &str) -> Option<LogLevel> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" | "err" => Some(LogLevel::Error),
        other => {
            eprintln!("Invalid log level '{other}', using default");
            None
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: default_log_format(),
        }
    }
}

/// Log level enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_level(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid log level '{s}', expected one of: trace, debug, info, warn, error"
            ))
        })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log format enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}
