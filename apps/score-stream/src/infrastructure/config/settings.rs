//! Relay Configuration Settings
//!
//! Configuration types for the score relay, loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::application::services::{DEFAULT_QUEUE_CAPACITY, SessionConfig};

/// Default notification channel name.
pub const DEFAULT_CHANNEL: &str = "score_updates";

/// Postgres connection string.
#[derive(Clone)]
pub struct DatabaseUrl(String);

impl DatabaseUrl {
    /// Wrap a connection string.
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self(url)
    }

    /// Get the connection string.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DatabaseUrl([REDACTED])")
    }
}

/// Listening port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// SSE HTTP port.
    pub http_port: u16,
    /// Health check and metrics HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 8080,
            health_port: 8082,
        }
    }
}

/// Notification bridge settings.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    /// Channel the store publishes score changes on.
    pub channel: String,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Viewer stream settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Interval between keep-alive comments.
    pub keep_alive_interval: Duration,
    /// Per-subscriber event queue depth.
    pub queue_capacity: usize,
    /// Frames buffered between the writer task and the HTTP body.
    pub outbound_buffer: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            keep_alive_interval: Duration::from_secs(25),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            outbound_buffer: 16,
        }
    }
}

impl From<&SessionSettings> for SessionConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            keep_alive_interval: settings.keep_alive_interval,
            outbound_buffer: settings.outbound_buffer,
        }
    }
}

/// Complete relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Store connection string for the listener connection.
    pub database_url: DatabaseUrl,
    /// Port settings.
    pub server: ServerSettings,
    /// Notification bridge settings.
    pub notify: NotifySettings,
    /// Viewer stream settings.
    pub session: SessionSettings,
}

impl RelayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or a
    /// value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Unparseable optional values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Same as [`RelayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;
        if database_url.trim().is_empty() {
            return Err(ConfigError::EmptyValue("DATABASE_URL".to_string()));
        }

        let server_defaults = ServerSettings::default();
        let server = ServerSettings {
            http_port: parse_env(&lookup, "SCORE_STREAM_HTTP_PORT", server_defaults.http_port),
            health_port: parse_env(
                &lookup,
                "SCORE_STREAM_HEALTH_PORT",
                server_defaults.health_port,
            ),
        };

        let notify_defaults = NotifySettings::default();
        let notify = NotifySettings {
            channel: lookup("SCORE_STREAM_CHANNEL").unwrap_or(notify_defaults.channel),
            reconnect_delay: parse_env_duration_millis(
                &lookup,
                "SCORE_STREAM_RECONNECT_DELAY_MS",
                notify_defaults.reconnect_delay,
            ),
        };

        let session_defaults = SessionSettings::default();
        let session = SessionSettings {
            keep_alive_interval: parse_env_duration_secs(
                &lookup,
                "SCORE_STREAM_KEEP_ALIVE_SECS",
                session_defaults.keep_alive_interval,
            ),
            queue_capacity: parse_env(
                &lookup,
                "SCORE_STREAM_QUEUE_CAPACITY",
                session_defaults.queue_capacity,
            ),
            outbound_buffer: parse_env(
                &lookup,
                "SCORE_STREAM_OUTBOUND_BUFFER",
                session_defaults.outbound_buffer,
            ),
        };

        let config = Self {
            database_url: DatabaseUrl::new(database_url),
            server,
            notify,
            session,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_channel(&self.notify.channel) {
            return Err(ConfigError::InvalidValue {
                key: "SCORE_STREAM_CHANNEL",
                reason: "must be a non-empty identifier of letters, digits and underscores",
            });
        }
        if self.notify.reconnect_delay.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SCORE_STREAM_RECONNECT_DELAY_MS",
                reason: "must be greater than zero",
            });
        }
        if self.session.keep_alive_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SCORE_STREAM_KEEP_ALIVE_SECS",
                reason: "must be greater than zero",
            });
        }
        if self.session.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCORE_STREAM_QUEUE_CAPACITY",
                reason: "must be greater than zero",
            });
        }
        if self.session.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCORE_STREAM_OUTBOUND_BUFFER",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable is set but unusable.
    #[error("environment variable {key} {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

fn is_valid_channel(channel: &str) -> bool {
    !channel.is_empty()
        && channel.len() <= 63
        && channel
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !channel.starts_with(|c: char| c.is_ascii_digit())
}

fn parse_env<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
