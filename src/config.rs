//! Client configuration loaded from environment variables or built in code.
//!
//! Follows 12-factor style: every setting can come from an environment
//! variable (or a `.env` file via `dotenvy`). The resulting [`ClientConfig`]
//! is an immutable value handed to [`crate::Client::new`].

use std::time::Duration;

/// Default GraphQL HTTP endpoint.
pub const DEFAULT_QUERY_ENDPOINT: &str = "https://v1.igloo.ooo/graphql";

/// Default graphql-ws subscription endpoint.
pub const DEFAULT_SUBSCRIPTION_ENDPOINT: &str = "wss://v1.igloo.ooo/subscriptions";

/// Default time the server gets to answer a client close frame.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Error raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Connection settings for one igloo API account.
///
/// Built once and never mutated; clone it to share between clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token sent on every query and in the subscription handshake.
    pub token: String,

    /// HTTP(S) URL that receives `{query}` POST requests.
    pub query_endpoint: String,

    /// WS(S) URL that speaks the `graphql-ws` sub-protocol.
    pub subscription_endpoint: String,

    /// How long a stopping subscription waits for the server to answer the
    /// close frame before tearing the connection down.
    pub shutdown_grace: Duration,
}

impl ClientConfig {
    /// Creates a configuration with the default shutdown grace period.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        query_endpoint: impl Into<String>,
        subscription_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            query_endpoint: query_endpoint.into(),
            subscription_endpoint: subscription_endpoint.into(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Returns a copy with a different shutdown grace period.
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// | Variable                      | Default                             |
    /// |-------------------------------|-------------------------------------|
    /// | `IGLOO_TOKEN`                 | required                            |
    /// | `IGLOO_QUERY_ENDPOINT`        | [`DEFAULT_QUERY_ENDPOINT`]          |
    /// | `IGLOO_SUBSCRIPTION_ENDPOINT` | [`DEFAULT_SUBSCRIPTION_ENDPOINT`]   |
    /// | `IGLOO_SHUTDOWN_GRACE_MS`     | 2000                                |
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `IGLOO_TOKEN` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let token =
            std::env::var("IGLOO_TOKEN").map_err(|_| ConfigError::Missing("IGLOO_TOKEN"))?;

        let query_endpoint = std::env::var("IGLOO_QUERY_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_QUERY_ENDPOINT.to_string());
        let subscription_endpoint = std::env::var("IGLOO_SUBSCRIPTION_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_SUBSCRIPTION_ENDPOINT.to_string());

        let grace_ms = parse_env(
            "IGLOO_SHUTDOWN_GRACE_MS",
            u64::try_from(DEFAULT_SHUTDOWN_GRACE.as_millis()).unwrap_or(2_000),
        );

        Ok(Self::new(token, query_endpoint, subscription_endpoint)
            .with_shutdown_grace(Duration::from_millis(grace_ms)))
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
