//! Client error types with category mapping.
//!
//! [`ClientError`] is the central error type for the client. Each variant
//! maps to one [`ErrorKind`], which tells the caller whether the failure
//! came from the transport, from a protocol violation, or from the GraphQL
//! server itself.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Broad failure category of a [`ClientError`].
///
/// | Kind          | Meaning                                              |
/// |---------------|------------------------------------------------------|
/// | `Transport`   | Endpoint, connect, read or write failure             |
/// | `Protocol`    | Malformed frame, rejected handshake, unexpected type |
/// | `Application` | Server-reported GraphQL `errors` array               |
///
/// No kind is retried: every error is terminal for its call or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection open, read or write failure.
    Transport,
    /// The peer broke the wire protocol.
    Protocol,
    /// The server answered with GraphQL errors.
    Application,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Application => "application",
        };
        f.write_str(name)
    }
}

/// Error returned by queries, mutations and subscriptions.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint address could not be parsed or has the wrong scheme.
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint {
        /// The endpoint as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// WebSocket connect, read or write failure.
    #[error("websocket error: {0}")]
    WebSocket(#[source] Box<tungstenite::Error>),

    /// HTTP request or response body failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The connection ended without a normal closure.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// A frame or response body was not the expected JSON.
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered `connection_init` with something other than
    /// `connection_ack`.
    #[error("handshake rejected: expected connection_ack, got '{0}'")]
    HandshakeRejected(String),

    /// A frame type that requires a payload arrived without one.
    #[error("{0} message without payload")]
    MissingPayload(String),

    /// The server sent a frame type this client does not handle.
    #[error("unknown message type {0}")]
    UnknownMessageType(String),

    /// Server-reported GraphQL errors, serialized verbatim.
    #[error("{0}")]
    Application(String),
}

impl ClientError {
    /// Returns the failure category for this variant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEndpoint { .. }
            | Self::WebSocket(_)
            | Self::Http(_)
            | Self::ConnectionClosed(_) => ErrorKind::Transport,
            Self::Decode(_)
            | Self::HandshakeRejected(_)
            | Self::MissingPayload(_)
            | Self::UnknownMessageType(_) => ErrorKind::Protocol,
            Self::Application(_) => ErrorKind::Application,
        }
    }

    /// Builds an [`ClientError::Application`] from a GraphQL `errors` array.
    ///
    /// The array is serialized back to JSON so the caller sees exactly what
    /// the server reported.
    #[must_use]
    pub fn from_graphql_errors(errors: &[serde_json::Value]) -> Self {
        match serde_json::to_string(errors) {
            Ok(text) => Self::Application(text),
            Err(e) => Self::Decode(e),
        }
    }
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
