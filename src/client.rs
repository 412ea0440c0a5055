//! High-level client: queries, mutations and subscriptions against one
//! configured account.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::query;
use crate::subscription::{Payload, Subscription, session};

/// GraphQL client bound to one [`ClientConfig`].
///
/// Cheap to clone: the HTTP connection pool is shared between clones.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client from an immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built
    /// (for instance when no TLS backend can be initialized).
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { config, http })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs a GraphQL query over HTTP and returns its `data` object.
    ///
    /// # Errors
    ///
    /// See [`query::post_query`]: invalid endpoint, HTTP failure,
    /// undecodable body, or server-reported GraphQL errors.
    pub async fn query(&self, query: &str) -> Result<Payload, ClientError> {
        query::post_query(
            &self.http,
            &self.config.query_endpoint,
            &self.config.token,
            query,
        )
        .await
    }

    /// Runs a GraphQL mutation.
    ///
    /// Mutations travel exactly like queries: same endpoint, same envelope.
    ///
    /// # Errors
    ///
    /// Same as [`Client::query`].
    pub async fn mutate(&self, mutation: &str) -> Result<Payload, ClientError> {
        self.query(mutation).await
    }

    /// Opens a `graphql-ws` connection and starts a subscription.
    ///
    /// On success the returned [`Subscription`] yields one message per
    /// server event until it is stopped, fails, or the server closes it.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the endpoint is invalid, the connection
    /// cannot be opened, or the server does not acknowledge the handshake.
    pub async fn subscribe(&self, query: &str) -> Result<Subscription, ClientError> {
        tracing::debug!(endpoint = %self.config.subscription_endpoint, "opening subscription");
        session::open(&self.config, query).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::DEFAULT_SUBSCRIPTION_ENDPOINT;
    use crate::testing;

    fn client_for(base: &str) -> Client {
        let config = ClientConfig::new(
            "tok",
            format!("{base}/graphql"),
            DEFAULT_SUBSCRIPTION_ENDPOINT,
        );
        let Ok(client) = Client::new(config) else {
            panic!("client construction failed");
        };
        client
    }

    #[tokio::test]
    async fn mutate_behaves_like_query() {
        let base = testing::spawn_graphql_server().await;
        let client = client_for(&base);

        let doc = "mutation { floatValue(id: \"c3fd\", value: 1.5) { id } }";
        let Ok(from_query) = client.query(doc).await else {
            panic!("query failed");
        };
        let Ok(from_mutate) = client.mutate(doc).await else {
            panic!("mutate failed");
        };
        assert_eq!(from_query, from_mutate);
        assert_eq!(from_mutate.get("query"), Some(&json!(doc)));
    }

    #[tokio::test]
    async fn mutate_surfaces_graphql_errors() {
        let base = testing::spawn_graphql_server().await;
        let client = client_for(&base);

        let Err(err) = client.mutate("mutation { missing }").await else {
            panic!("expected errors");
        };
        assert!(err.to_string().contains("variable not found"));
    }

    #[tokio::test]
    async fn subscribe_uses_configured_endpoint_and_token() {
        let (url, server) = testing::spawn_ws_server(|mut ws| async move {
            let init = testing::recv_json(&mut ws).await;
            testing::send_json(&mut ws, &json!({"type": "connection_ack"})).await;
            let _ = testing::recv_json(&mut ws).await;
            testing::send_json(&mut ws, &json!({"type": "data", "payload": {"data": {"v": 3}}}))
                .await;
            testing::drain(&mut ws).await;
            init
        })
        .await;

        let config = ClientConfig::new("tok", "http://127.0.0.1:9/graphql", url)
            .with_shutdown_grace(Duration::from_millis(200));
        let Ok(client) = Client::new(config) else {
            panic!("client construction failed");
        };
        let Ok(mut sub) = client.subscribe("subscription { v }").await else {
            panic!("subscribe failed");
        };
        let Some(Ok(payload)) = sub.next().await else {
            panic!("expected payload");
        };
        assert_eq!(payload.get("v"), Some(&json!(3)));
        sub.shutdown().await;

        let Ok(init) = server.await else {
            panic!("server task failed");
        };
        assert_eq!(init.pointer("/payload/Authorization"), Some(&json!("Bearer tok")));
    }
}
