//! Subscription layer: session setup, frame reader, dispatch loop.
//!
//! A [`Subscription`] is the caller's end of one live `graphql-ws`
//! subscription: an ordered stream of [`SubscriptionMessage`]s plus a
//! [`StopHandle`] for cooperative shutdown.

pub mod reader;
pub mod session;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Decoded `data` object of one subscription event.
pub type Payload = Map<String, Value>;

/// One item delivered to the caller: an event payload or the terminal error.
///
/// After an `Err` the channel is closed and no further items follow.
pub type SubscriptionMessage = Result<Payload, ClientError>;

/// Write-once request to end a subscription.
///
/// Cloneable and safe to call any number of times, before or after the
/// session has ended. Only the first call has an effect.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Creates a handle that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the session to send a close frame and shut down.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("subscription stop requested");
        }
        self.token.cancel();
    }

    /// Returns `true` once [`StopHandle::stop`] has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Caller's end of a live subscription.
///
/// Messages arrive in the order the server sent them. The stream ends
/// (`next` returns `None`) after a terminal error, after a stop completes,
/// or when the server closes the connection normally.
#[derive(Debug)]
pub struct Subscription {
    messages: mpsc::Receiver<SubscriptionMessage>,
    stop: StopHandle,
}

impl Subscription {
    pub(crate) fn new(messages: mpsc::Receiver<SubscriptionMessage>, stop: StopHandle) -> Self {
        Self { messages, stop }
    }

    /// Waits for the next message, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<SubscriptionMessage> {
        self.messages.recv().await
    }

    /// Returns a handle that can stop this subscription from another task.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests shutdown. See [`StopHandle::stop`].
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Requests shutdown and waits until the stream has ended.
    ///
    /// Messages still in flight are discarded.
    pub async fn shutdown(mut self) {
        self.stop.stop();
        while self.messages.recv().await.is_some() {}
    }

    /// Splits into the raw receiver and the stop handle.
    #[must_use]
    pub fn into_parts(self) -> (mpsc::Receiver<SubscriptionMessage>, StopHandle) {
        (self.messages, self.stop)
    }
}
