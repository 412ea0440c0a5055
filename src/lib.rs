//! # igloo-client
//!
//! GraphQL client for the igloo API: plain queries and mutations over HTTP,
//! and live subscriptions over the `graphql-ws` WebSocket protocol.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!     │
//!     ├── Client (client)
//!     │     ├── query / mutate ──► HTTP POST (query)
//!     │     └── subscribe ───────► Subscription Session (subscription)
//!     │
//!     ├── Subscription Session
//!     │     ├── handshake: connection_init → connection_ack → start
//!     │     ├── Frame Reader task (subscription::reader)
//!     │     └── dispatch loop ─► Message Classifier (protocol)
//!     │
//!     └── Transport Connection (transport, tokio-tungstenite)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use igloo_client::{Client, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::from_env()?)?;
//! let mut sub = client
//!     .subscribe("subscription { variableUpdated(id: \"c3fd\") { id } }")
//!     .await?;
//!
//! while let Some(message) = sub.next().await {
//!     let payload = message?;
//!     println!("{payload:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod query;
pub mod subscription;
pub mod transport;

#[cfg(test)]
#[allow(clippy::panic)]
mod testing;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind};
pub use subscription::{Payload, StopHandle, Subscription, SubscriptionMessage};
