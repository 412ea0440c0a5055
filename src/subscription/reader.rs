//! Background frame reader.
//!
//! Owns the read half of the connection and forwards raw frames to the
//! dispatch loop over a bounded channel.

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::error::ClientError;
use crate::transport::{self, Inbound};

/// Item handed to the dispatch loop: a raw frame, or the error that ended
/// the connection. Channel closure means normal closure.
pub type ReaderItem = Result<Vec<u8>, ClientError>;

/// Reads frames until the connection ends, forwarding each one on
/// `frame_tx`.
///
/// - Normal closure (close code 1000): returns, dropping `frame_tx`.
/// - Any other failure: forwards it once unclassified, then returns.
/// - Receiver gone: returns.
///
/// The reader never closes the connection itself.
pub async fn read_frames<S>(mut stream: S, frame_tx: mpsc::Sender<ReaderItem>)
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        match transport::read_frame(&mut stream).await {
            Inbound::Frame(frame) => {
                if frame_tx.send(Ok(frame)).await.is_err() {
                    return;
                }
            }
            Inbound::NormalClose => {
                tracing::debug!("subscription connection closed normally");
                return;
            }
            Inbound::Failed(e) => {
                tracing::warn!(error = %e, "subscription connection failed");
                let _ = frame_tx.send(Err(e)).await;
                return;
            }
        }
    }
}
