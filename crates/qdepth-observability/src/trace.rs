//! Tracing subscriber setup
//!
//! `RUST_LOG` is honoured when set. Otherwise the level is `info`, or `debug`
//! when verbose logging is requested.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ObservabilityError;

/// Output format of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable single-line records
    #[default]
    Text,
    /// One JSON object per record
    Json,
}

/// Log format name that is neither `text` nor `json`
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown log format '{0}', expected 'text' or 'json'")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(UnknownLogFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Install the global tracing subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool, format: LogFormat) -> Result<(), ObservabilityError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let (json, text) = match format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .try_init()
        .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    tracing::debug!(format = %format, verbose, "Initialized tracing");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(
            "yaml".parse::<LogFormat>(),
            Err(UnknownLogFormat("yaml".to_string()))
        );
    }

    #[test]
    fn test_log_format_display_round_trips() {
        for format in [LogFormat::Text, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_tracing(false, LogFormat::Text);
        let second = init_tracing(true, LogFormat::Json);
        assert!(matches!(second, Err(ObservabilityError::TracingInit(_))));
    }
}
