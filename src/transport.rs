//! WebSocket transport: endpoint validation, connect, framed read/write.
//!
//! The session code is generic over [`FrameTransport`], so anything that is
//! a `Stream` + `Sink` of tungstenite [`Message`]s can carry a subscription.
//! [`connect`] produces the production implementation, a
//! `tokio-tungstenite` stream over TCP or TLS.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;
use crate::protocol::{ClientFrame, GRAPHQL_WS_PROTOCOL};

/// WebSocket stream returned by [`connect`].
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Duplex, message-oriented connection a subscription runs over.
pub trait FrameTransport:
    Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin + Send + 'static
{
}

impl<T> FrameTransport for T where
    T: Stream<Item = Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin
        + Send
        + 'static
{
}

/// Result of reading the next frame off a connection.
#[derive(Debug)]
pub enum Inbound {
    /// A text or binary frame, as raw bytes.
    Frame(Vec<u8>),
    /// The peer sent a close frame with code 1000.
    NormalClose,
    /// Any other end of the connection.
    Failed(ClientError),
}

/// Parses `raw` and checks that it uses one of `schemes` and names a host.
///
/// # Errors
///
/// Returns [`ClientError::InvalidEndpoint`] if the address does not parse,
/// uses another scheme, or has no host.
pub fn parse_endpoint(raw: &str, schemes: &[&str]) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !schemes.contains(&url.scheme()) {
        return Err(invalid(format!(
            "unsupported scheme '{}'; expected one of {}",
            url.scheme(),
            schemes.join(", ")
        )));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Opens a WebSocket to `endpoint`, advertising the `graphql-ws`
/// sub-protocol.
///
/// # Errors
///
/// Returns [`ClientError::WebSocket`] if the request cannot be built or the
/// TCP, TLS or upgrade step fails.
pub async fn connect(endpoint: &Url) -> Result<WsStream, ClientError> {
    let mut request = endpoint.as_str().into_client_request()?;
    request.headers_mut().insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(GRAPHQL_WS_PROTOCOL),
    );

    let (stream, response) = tokio_tungstenite::connect_async(request).await?;
    tracing::debug!(%endpoint, status = %response.status(), "websocket connected");
    Ok(stream)
}

/// Encodes `frame` and writes it as a text message.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if encoding fails or
/// [`ClientError::WebSocket`] if the write fails.
pub async fn send_frame<S>(sink: &mut S, frame: &ClientFrame) -> Result<(), ClientError>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let text = frame.to_text()?;
    sink.send(Message::text(text)).await?;
    Ok(())
}

/// Reads until the next data-bearing frame or the end of the connection.
///
/// Ping, pong and raw frames are skipped; tungstenite answers pings on its
/// own. A close frame counts as normal closure only when its code is
/// [`CloseCode::Normal`].
pub async fn read_frame<S>(stream: &mut S) -> Inbound
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let Some(next) = stream.next().await else {
            return Inbound::Failed(ClientError::ConnectionClosed(
                "stream ended without a close frame".to_string(),
            ));
        };

        match next {
            Ok(Message::Text(text)) => return Inbound::Frame(text.as_bytes().to_vec()),
            Ok(Message::Binary(data)) => return Inbound::Frame(data.to_vec()),
            Ok(Message::Close(Some(frame))) if frame.code == CloseCode::Normal => {
                return Inbound::NormalClose;
            }
            Ok(Message::Close(Some(frame))) => {
                return Inbound::Failed(ClientError::ConnectionClosed(format!(
                    "close {} ({})",
                    u16::from(frame.code),
                    frame.reason.as_str()
                )));
            }
            Ok(Message::Close(None)) => {
                return Inbound::Failed(ClientError::ConnectionClosed(
                    "close 1005 (no status)".to_string(),
                ));
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
            Err(e) => return Inbound::Failed(e.into()),
        }
    }
}
