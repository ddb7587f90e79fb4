//! Auth service configuration, read once from the environment.

use std::env;
use std::time::Duration;

use rust_common::env::{
    load_dotenv, parse_duration_env, parse_env, require_positive, string_env,
};
use rust_common::ConfigError;
use secrecy::SecretString;

use crate::store::{DatabaseTarget, PgStoreConfig};

/// Used when `JWT_SECRET` is unset. Startup logs a warning.
pub const DEVELOPMENT_JWT_SECRET: &str = "cloudshop-secret-key-change-in-production";

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// PostgreSQL location and credentials
    pub database: DatabaseTarget,
    /// Pool size
    pub db_max_connections: u32,
    /// Wait bound for a pooled connection
    pub db_acquire_timeout: Duration,
    /// Bound on every store call
    pub store_timeout: Duration,
    /// HS256 signing secret
    pub jwt_secret: SecretString,
    /// Whether `jwt_secret` is the development fallback
    pub jwt_secret_is_default: bool,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Period of the expired-token sweep
    pub token_sweep_interval: Duration,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
    /// Drain deadline for background tasks
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        let jwt_secret_is_default = jwt_secret.is_none();

        let config = Self {
            host: string_env("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8081)?,
            database: database_target_from_env()?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: parse_duration_env("DB_ACQUIRE_TIMEOUT", "5")?,
            store_timeout: parse_duration_env("STORE_TIMEOUT", "5")?,
            jwt_secret: SecretString::from(
                jwt_secret.unwrap_or_else(|| DEVELOPMENT_JWT_SECRET.to_string()),
            ),
            jwt_secret_is_default,
            access_token_ttl: parse_duration_env("JWT_EXPIRES_IN", "15m")?,
            refresh_token_ttl: parse_duration_env("REFRESH_TOKEN_EXPIRES_IN", "7d")?,
            bcrypt_cost: parse_env("BCRYPT_COST", 12)?,
            token_sweep_interval: parse_duration_env("TOKEN_SWEEP_INTERVAL", "3600")?,
            cors_origin: string_env("CORS_ORIGIN", "*"),
            shutdown_timeout: parse_duration_env("SHUTDOWN_TIMEOUT", "30")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidLimit("DB_MAX_CONNECTIONS".to_string()));
        }
        require_positive("DB_ACQUIRE_TIMEOUT", self.db_acquire_timeout)?;
        require_positive("STORE_TIMEOUT", self.store_timeout)?;
        require_positive("JWT_EXPIRES_IN", self.access_token_ttl)?;
        require_positive("REFRESH_TOKEN_EXPIRES_IN", self.refresh_token_ttl)?;
        require_positive("TOKEN_SWEEP_INTERVAL", self.token_sweep_interval)?;
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::ParseError {
                name: "BCRYPT_COST".to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }
        if self.refresh_token_ttl <= self.access_token_ttl {
            return Err(ConfigError::Inconsistent(
                "REFRESH_TOKEN_EXPIRES_IN must exceed JWT_EXPIRES_IN".to_string(),
            ));
        }
        Ok(())
    }

    /// Store settings derived from this config.
    #[must_use]
    pub fn store_config(&self) -> PgStoreConfig {
        PgStoreConfig {
            target: self.database.clone(),
            max_connections: self.db_max_connections,
            acquire_timeout: self.db_acquire_timeout,
            call_timeout: self.store_timeout,
        }
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `DATABASE_URL` wins; otherwise the discrete `DB_*` settings.
fn database_target_from_env() -> Result<DatabaseTarget, ConfigError> {
    if let Some(url) = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        return Ok(DatabaseTarget::Url(SecretString::from(url)));
    }

    Ok(DatabaseTarget::Parts {
        host: string_env("DB_HOST", "postgres"),
        port: parse_env("DB_PORT", 5432)?,
        database: string_env("DB_NAME", "cloudshop"),
        username: string_env("DB_USER", "cloudshop"),
        password: SecretString::from(string_env("DB_PASSWORD", "cloudshop123")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 8081,
            database: DatabaseTarget::Parts {
                host: "localhost".into(),
                port: 5432,
                database: "test".into(),
                username: "cloudshop".into(),
                password: SecretString::from("p@ss/w#rd".to_string()),
            },
            db_max_connections: 10,
            db_acquire_timeout: Duration::from_secs(5),
            store_timeout: Duration::from_secs(5),
            jwt_secret: SecretString::from("s".to_string()),
            jwt_secret_is_default: false,
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(604_800),
            bcrypt_cost: 12,
            token_sweep_interval: Duration::from_secs(3600),
            cors_origin: "*".into(),
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base().validate().is_ok());
        assert_eq!(base().bind_address(), "127.0.0.1:8081");
    }

    #[test]
    fn test_zero_port_rejected() {
        let config = Config { port: 0, ..base() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = Config {
            access_token_ttl: Duration::ZERO,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_refresh_must_outlive_access() {
        let config = Config {
            refresh_token_ttl: Duration::from_secs(60),
            ..base()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let config = Config {
            bcrypt_cost: 3,
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let printed = format!("{:?}", base());
        assert!(!printed.contains("p@ss/w#rd"));
    }

    #[test]
    fn test_store_config_keeps_discrete_credentials() {
        let options = base().store_config().target.connect_options().unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_database(), Some("test"));
    }
}
