//! Subscription session: handshake, then the dispatch loop.
//!
//! The session owns its connection from handshake to teardown. After the
//! start frame is sent, the connection is split: the read half goes to the
//! [frame reader](super::reader), the write half stays with the dispatch
//! loop, which is the only writer of the caller's channel.

use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use super::reader::{self, ReaderItem};
use super::{StopHandle, Subscription, SubscriptionMessage};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::protocol::{Classification, ClientFrame, classify, expect_ack};
use crate::transport::{self, FrameTransport, Inbound};

/// Opens the configured subscription endpoint and starts `query` on it.
///
/// # Errors
///
/// Returns a [`ClientError`] if the endpoint is invalid, the connection
/// cannot be opened, or the handshake fails. No channel exists in that case.
pub async fn open(config: &ClientConfig, query: &str) -> Result<Subscription, ClientError> {
    let endpoint = transport::parse_endpoint(&config.subscription_endpoint, &["ws", "wss"])?;
    let conn = transport::connect(&endpoint).await?;
    start(conn, &config.token, query, config.shutdown_grace).await
}

/// Runs the handshake on an already open connection, sends the start frame,
/// then spawns the reader and the dispatch loop.
///
/// `connection_init` → wait for `connection_ack` → `start`. The start frame
/// is never sent before the acknowledgment has been seen.
///
/// # Errors
///
/// - [`ClientError::WebSocket`] if a write fails.
/// - [`ClientError::Decode`] if the first server frame is not JSON.
/// - [`ClientError::HandshakeRejected`] if it is not `connection_ack`.
/// - [`ClientError::ConnectionClosed`] if the connection ends first.
pub async fn start<C>(
    mut conn: C,
    token: &str,
    query: &str,
    shutdown_grace: Duration,
) -> Result<Subscription, ClientError>
where
    C: FrameTransport,
{
    transport::send_frame(&mut conn, &ClientFrame::connection_init(token)).await?;
    tracing::debug!("connection_init sent");

    match transport::read_frame(&mut conn).await {
        Inbound::Frame(frame) => expect_ack(&frame)?,
        Inbound::NormalClose => {
            return Err(ClientError::ConnectionClosed(
                "server closed the connection before connection_ack".to_string(),
            ));
        }
        Inbound::Failed(e) => return Err(e),
    }
    tracing::debug!("connection_ack received");

    transport::send_frame(&mut conn, &ClientFrame::start(query)).await?;

    let (sink, stream) = conn.split();
    let (frame_tx, frame_rx) = mpsc::channel(1);
    let (message_tx, message_rx) = mpsc::channel(1);
    let stop = StopHandle::new();

    let reader = tokio::spawn(reader::read_frames(stream, frame_tx));
    tokio::spawn(run_session(
        sink,
        frame_rx,
        reader,
        message_tx,
        stop.token(),
        shutdown_grace,
    ));

    tracing::info!("subscription started");
    Ok(Subscription::new(message_rx, stop))
}

/// Dispatch loop plus teardown. The caller's channel closes as soon as the
/// loop ends; stopping the reader and closing the write half come after.
async fn run_session<K>(
    mut sink: K,
    mut frames: mpsc::Receiver<ReaderItem>,
    reader: JoinHandle<()>,
    messages: mpsc::Sender<SubscriptionMessage>,
    stop: CancellationToken,
    shutdown_grace: Duration,
) where
    K: Sink<Message, Error = WsError> + Unpin,
{
    dispatch(&mut sink, &mut frames, &messages, &stop, shutdown_grace).await;
    drop(messages);

    reader.abort();
    if tokio::time::timeout(shutdown_grace, sink.close()).await.is_err() {
        tracing::debug!("timed out closing subscription connection");
    }
    tracing::debug!("subscription ended");
}

async fn dispatch<K>(
    sink: &mut K,
    frames: &mut mpsc::Receiver<ReaderItem>,
    messages: &mpsc::Sender<SubscriptionMessage>,
    stop: &CancellationToken,
    shutdown_grace: Duration,
) where
    K: Sink<Message, Error = WsError> + Unpin,
{
    loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => {
                shut_down(sink, frames, messages, shutdown_grace).await;
                return;
            }

            () = messages.closed() => {
                tracing::debug!("subscription receiver dropped");
                return;
            }

            item = frames.recv() => {
                let frame = match item {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        let _ = messages.send(Err(e)).await;
                        return;
                    }
                    None => return,
                };

                match classify(&frame) {
                    Classification::KeepAlive => {
                        tracing::trace!("keep-alive");
                    }
                    Classification::Data(payload) => {
                        if messages.send(Ok(payload)).await.is_err() {
                            return;
                        }
                    }
                    Classification::Terminal(e) => {
                        tracing::warn!(error = %e, kind = %e.kind(), "subscription terminated");
                        let _ = messages.send(Err(e)).await;
                        return;
                    }
                }
            }
        }
    }
}

/// Sends a normal-closure close frame, then gives the server
/// `shutdown_grace` to answer with one more frame or a close.
async fn shut_down<K>(
    sink: &mut K,
    frames: &mut mpsc::Receiver<ReaderItem>,
    messages: &mpsc::Sender<SubscriptionMessage>,
    shutdown_grace: Duration,
) where
    K: Sink<Message, Error = WsError> + Unpin,
{
    let close = Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    }));
    if let Err(e) = sink.send(close).await {
        tracing::warn!(error = %e, "failed to send close frame");
        let _ = messages.send(Err(e.into())).await;
        return;
    }

    match tokio::time::timeout(shutdown_grace, frames.recv()).await {
        Ok(_) => tracing::debug!("server answered close"),
        Err(_) => tracing::debug!(
            grace_ms = shutdown_grace.as_millis(),
            "no answer to close; forcing shutdown"
        ),
    }
}
