//! Connection configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6463;
pub const DEFAULT_ORIGIN: &str = "http://localhost";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing config: env var {var} not set")]
    Missing { var: &'static str },

    /// A variable is set but cannot be parsed.
    #[error("invalid config: {var}={value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Numeric application identifier sent as the `client_id` query parameter.
    pub client_id: u64,
    /// Value of the `Origin` header on the handshake.
    pub origin: String,
    pub host: String,
    pub port: u16,
    /// Per-request deadline. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Config with defaults for everything but the application id.
    #[must_use]
    pub fn new(client_id: u64) -> Self {
        Self {
            client_id,
            origin: DEFAULT_ORIGIN.to_owned(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `RPC_CLIENT_ID`
    ///
    /// Optional:
    /// - `RPC_ORIGIN`: default `http://localhost`
    /// - `RPC_HOST`: default `127.0.0.1`
    /// - `RPC_PORT`: default 6463
    /// - `RPC_REQUEST_TIMEOUT_SECS`: default 15, `0` disables the deadline
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the client id is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_id = lookup("RPC_CLIENT_ID").ok_or(ConfigError::Missing { var: "RPC_CLIENT_ID" })?;
        let client_id = parse_var("RPC_CLIENT_ID", &raw_id)?;

        let origin = lookup("RPC_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_owned());
        let host = lookup("RPC_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match lookup("RPC_PORT") {
            Some(raw) => parse_var("RPC_PORT", &raw)?,
            None => DEFAULT_PORT,
        };
        let timeout_secs = match lookup("RPC_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_var("RPC_REQUEST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self { client_id, origin, host, port, request_timeout: timeout_from_secs(timeout_secs) })
    }

    /// WebSocket URL of the RPC endpoint.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("ws://{}:{}/?v=1&client_id={}&encoding=json", self.host, self.port, self.client_id)
    }
}

/// Map a seconds count to a deadline, `0` meaning none.
#[must_use]
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_var<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var, value: raw.to_owned() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
