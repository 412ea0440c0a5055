//! `graphql-ws` frame types: client requests and the server envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// WebSocket sub-protocol negotiated with the subscription endpoint.
pub const GRAPHQL_WS_PROTOCOL: &str = "graphql-ws";

/// Operation id of the single subscription carried by a session.
pub const SUBSCRIPTION_ID: &str = "1";

/// Frame sent from client to server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame on a new connection; carries the credentials.
    ConnectionInit {
        /// Authorization header forwarded to the server.
        payload: InitPayload,
    },
    /// Starts the subscription once the server acknowledged the init.
    Start {
        /// Operation id, always [`SUBSCRIPTION_ID`].
        id: String,
        /// The GraphQL document to run.
        payload: StartPayload,
    },
}

/// Payload of [`ClientFrame::ConnectionInit`].
#[derive(Debug, Clone, Serialize)]
pub struct InitPayload {
    /// `Bearer <token>`.
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

/// Payload of [`ClientFrame::Start`].
#[derive(Debug, Clone, Serialize)]
pub struct StartPayload {
    /// GraphQL subscription document.
    pub query: String,
    /// Always serialized as `null`.
    pub variables: Option<Value>,
}

impl ClientFrame {
    /// Builds the `connection_init` frame for the given bearer token.
    #[must_use]
    pub fn connection_init(token: &str) -> Self {
        Self::ConnectionInit {
            payload: InitPayload {
                authorization: format!("Bearer {token}"),
            },
        }
    }

    /// Builds the `start` frame for the given subscription document.
    #[must_use]
    pub fn start(query: &str) -> Self {
        Self::Start {
            id: SUBSCRIPTION_ID.to_string(),
            payload: StartPayload {
                query: query.to_string(),
                variables: None,
            },
        }
    }

    /// Encodes the frame as a JSON text message.
    ///
    /// String fields are escaped by the JSON encoder, so quotes and newlines
    /// in the query survive the trip.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if encoding fails.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `payload` of a server `data` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPayload {
    /// Result of the subscription for this event.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    /// GraphQL errors reported by the server.
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

/// Envelope as it appears on the wire, before mapping to [`ServerFrame`].
#[derive(Debug, Deserialize)]
struct RawServerFrame {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default)]
    payload: Option<DataPayload>,
}

/// Only the discriminator of a server frame.
#[derive(Debug, Deserialize)]
struct FrameHeader {
    #[serde(rename = "type")]
    frame_type: String,
}

/// Frame sent from server to client.
///
/// Any `type` the client does not act on lands in [`ServerFrame::Other`].
#[derive(Debug, Clone)]
pub enum ServerFrame {
    /// `connection_ack`: the server accepted `connection_init`.
    ConnectionAck,
    /// `ka`: keep-alive, no payload.
    KeepAlive,
    /// `data`: one subscription event, if the payload was present.
    Data(Option<DataPayload>),
    /// Any other frame type.
    Other(String),
}

impl ServerFrame {
    /// Decodes a full server frame, payload included.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the frame is not a JSON object
    /// with a string `type`, or if its payload has the wrong shape.
    pub fn decode(frame: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawServerFrame = serde_json::from_slice(frame)?;
        Ok(Self::from_parts(raw.frame_type, raw.payload))
    }

    /// Decodes only the `type` of a server frame, ignoring the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the frame has no string `type`.
    pub fn decode_type(frame: &[u8]) -> Result<Self, serde_json::Error> {
        let header: FrameHeader = serde_json::from_slice(frame)?;
        Ok(Self::from_parts(header.frame_type, None))
    }

    /// Returns the wire name of this frame type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::ConnectionAck => "connection_ack",
            Self::KeepAlive => "ka",
            Self::Data(_) => "data",
            Self::Other(name) => name,
        }
    }

    fn from_parts(frame_type: String, payload: Option<DataPayload>) -> Self {
        match frame_type.as_str() {
            "connection_ack" => Self::ConnectionAck,
            "ka" => Self::KeepAlive,
            "data" => Self::Data(payload),
            _ => Self::Other(frame_type),
        }
    }
}
