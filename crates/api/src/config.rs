use mlcloud_core::error::CoreError;
use mlcloud_core::token_service::{TokenSettings, DEFAULT_TOKEN_TTL_HOURS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background jobs, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT validation settings for caller identities.
    pub jwt: JwtConfig,
    /// Notebook access token settings.
    pub tokens: TokenConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            tokens: TokenConfig::from_env(),
        }
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Notebook access token configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// Server-side input to the per-owner key derivation.
    pub encryption_secret: String,
    /// Token lifetime in hours.
    pub ttl_hours: i64,
    /// Interval between expired-token sweeps, in seconds.
    pub purge_interval_secs: u64,
    /// Domain under which per-owner Jupyter hosts live.
    pub notebook_domain: String,
}

/// Default interval between expired-token sweeps.
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;

impl TokenConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default               |
    /// |-----------------------------|----------|-----------------------|
    /// | `TOKEN_ENCRYPTION_SECRET`   | **yes**  | --                    |
    /// | `TOKEN_TTL_HOURS`           | no       | `24`                  |
    /// | `TOKEN_PURGE_INTERVAL_SECS` | no       | `3600`                |
    /// | `NOTEBOOK_DOMAIN`           | no       | `notebooks.localhost` |
    ///
    /// # Panics
    ///
    /// Panics if the secret is missing or shorter than 32 bytes.
    pub fn from_env() -> Self {
        let encryption_secret = std::env::var("TOKEN_ENCRYPTION_SECRET")
            .expect("TOKEN_ENCRYPTION_SECRET must be set in the environment");

        let ttl_hours: i64 = std::env::var("TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_TTL_HOURS.to_string())
            .parse()
            .expect("TOKEN_TTL_HOURS must be a valid i64");

        let purge_interval_secs: u64 = std::env::var("TOKEN_PURGE_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_PURGE_INTERVAL_SECS.to_string())
            .parse()
            .expect("TOKEN_PURGE_INTERVAL_SECS must be a valid u64");
        assert!(purge_interval_secs > 0, "TOKEN_PURGE_INTERVAL_SECS must be positive");

        let notebook_domain =
            std::env::var("NOTEBOOK_DOMAIN").unwrap_or_else(|_| "notebooks.localhost".into());

        let config = Self {
            encryption_secret,
            ttl_hours,
            purge_interval_secs,
            notebook_domain,
        };
        if let Err(e) = config.settings() {
            panic!("Invalid token configuration: {e}");
        }
        config
    }

    /// Validated settings for the token service.
    pub fn settings(&self) -> Result<TokenSettings, CoreError> {
        let ttl = chrono::Duration::try_hours(self.ttl_hours).ok_or_else(|| {
            CoreError::Validation(format!("TOKEN_TTL_HOURS out of range: {}", self.ttl_hours))
        })?;
        TokenSettings::new(self.encryption_secret.as_bytes(), ttl)
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("encryption_secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .field("purge_interval_secs", &self.purge_interval_secs)
            .field("notebook_domain", &self.notebook_domain)
            .finish()
    }
}
