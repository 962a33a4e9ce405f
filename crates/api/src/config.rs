use std::str::FromStr;
use std::time::Duration;

use carehook_core::validation::EndpointPolicy;
use carehook_events::delivery::executor::{
    ExecutorConfig, DEFAULT_MAX_RESPONSE_BODY_BYTES, DEFAULT_TIMEOUT,
};

/// A malformed environment variable.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be a valid {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// PostgreSQL connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Outbound delivery settings.
    pub webhooks: WebhookSettings,
}

/// Settings for outbound webhook deliveries.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Per-attempt timeout in seconds (default: `10`).
    pub timeout_secs: u64,
    /// Captured response body bound in bytes (default: `4096`).
    pub max_response_bytes: usize,
    /// Accept loopback and private-range endpoint URLs (default: `false`).
    pub allow_private_hosts: bool,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BODY_BYTES,
            allow_private_hosts: false,
        }
    }
}

impl WebhookSettings {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_response_body_bytes: self.max_response_bytes,
        }
    }

    pub fn endpoint_policy(&self) -> EndpointPolicy {
        EndpointPolicy {
            allow_private_hosts: self.allow_private_hosts,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `DATABASE_URL`                | unset (in-memory store) |
    /// | `WEBHOOK_TIMEOUT_SECS`        | `10`                    |
    /// | `WEBHOOK_MAX_RESPONSE_BYTES`  | `4096`                  |
    /// | `WEBHOOK_ALLOW_PRIVATE_HOSTS` | `false`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// source, so parsing can be tested without touching process state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", 3000u16, "u16")?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30u64, "u64")?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let defaults = WebhookSettings::default();
        let webhooks = WebhookSettings {
            timeout_secs: parse_var(&lookup, "WEBHOOK_TIMEOUT_SECS", defaults.timeout_secs, "u64")?,
            max_response_bytes: parse_var(
                &lookup,
                "WEBHOOK_MAX_RESPONSE_BYTES",
                defaults.max_response_bytes,
                "usize",
            )?,
            allow_private_hosts: parse_var(
                &lookup,
                "WEBHOOK_ALLOW_PRIVATE_HOSTS",
                defaults.allow_private_hosts,
                "bool",
            )?,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            webhooks,
        })
    }
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            expected,
            value,
        }),
    }
}
