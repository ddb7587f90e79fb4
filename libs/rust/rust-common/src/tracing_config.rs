//! Tracing subscriber setup.
//!
//! Services call [`init_tracing`] once at startup; `RUST_LOG` overrides the
//! configured level when present.

use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
}

impl TracingConfig {
    /// Reads `LOG_LEVEL` and `LOG_FORMAT` for the named service. An
    /// unrecognized format falls back to text.
    #[must_use]
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: crate::env::string_env("LOG_LEVEL", "info"),
            format: crate::env::string_env("LOG_FORMAT", "text")
                .parse()
                .unwrap_or_default(),
        }
    }
}

/// Installs the global subscriber.
///
/// Calling it a second time is harmless; the first subscriber stays installed.
pub fn init_tracing(config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            service = %config.service_name,
            format = ?config.format,
            "Tracing initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let config = TracingConfig {
            service_name: "api-gateway".to_string(),
            log_level: "not a directive ===".to_string(),
            format: LogFormat::Text,
        };
        init_tracing(&config);
        init_tracing(&config);
    }
}
