//! Environment variable parsing with validation.
//!
//! Services build their `Config` once at startup from these helpers; nothing
//! reads the environment after that.

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable holding the URL
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// A duration that must be positive was zero
    #[error("Invalid duration for {0}: must be greater than 0")]
    InvalidDuration(String),

    /// A limit or size that must be positive was zero
    #[error("Invalid value for {0}: must be greater than 0")]
    InvalidLimit(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Two settings contradict each other
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Loads `.env` into the process environment if one exists.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Reads a string variable, falling back to `default`.
#[must_use]
pub fn string_env(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] when the variable is set but does not parse.
pub fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUrl`] when the value is not an absolute URL.
pub fn parse_url_env(name: &str, default: &str) -> Result<Url, ConfigError> {
    let url_str = string_env(name, default);
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a duration variable such as `900`, `15m`, `7d`.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] for an unrecognized value.
pub fn parse_duration_env(name: &str, default: &str) -> Result<Duration, ConfigError> {
    let raw = string_env(name, default);
    parse_duration(&raw).map_err(|reason| ConfigError::ParseError {
        name: name.to_string(),
        reason,
    })
}

/// Parse a duration string. A bare number is seconds; `s`, `m`, `h` and `d`
/// suffixes are accepted.
///
/// # Errors
///
/// Returns a description of the problem when the value is not understood.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("expected a number with optional unit, got {raw:?}"))?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit {other:?}")),
    };

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration {raw:?} overflows"))
}

/// Rejects a zero duration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] naming `field`.
pub fn require_positive(field: &str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::InvalidDuration(field.to_string()));
    }
    Ok(())
}
