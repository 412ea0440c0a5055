//! Maps raw inbound frames to dispatch outcomes.
//!
//! Pure functions: the dispatch loop hands a frame in and acts on the
//! returned [`Classification`]. Keep-alives are the only non-terminal frames
//! that produce nothing.

use super::messages::ServerFrame;
use crate::error::ClientError;
use crate::subscription::Payload;

/// What the dispatch loop should do with one inbound frame.
#[derive(Debug)]
pub enum Classification {
    /// Keep-alive: emit nothing, keep reading.
    KeepAlive,
    /// Subscription event: emit it and keep reading.
    Data(Payload),
    /// Emit this error and end the session.
    Terminal(ClientError),
}

/// Classifies a frame received after the handshake.
///
/// | Frame                                  | Outcome                          |
/// |----------------------------------------|----------------------------------|
/// | not decodable                          | `Terminal(Decode)`               |
/// | `ka`                                   | `KeepAlive`                      |
/// | `data`, non-empty `payload.errors`     | `Terminal(Application)`          |
/// | `data`, otherwise                      | `Data(payload.data)`             |
/// | `data` without `payload`               | `Terminal(MissingPayload)`       |
/// | anything else                          | `Terminal(UnknownMessageType)`   |
#[must_use]
pub fn classify(frame: &[u8]) -> Classification {
    let frame = match ServerFrame::decode(frame) {
        Ok(frame) => frame,
        Err(e) => return Classification::Terminal(e.into()),
    };

    match frame {
        ServerFrame::KeepAlive => Classification::KeepAlive,
        ServerFrame::Data(Some(payload)) => match payload.errors {
            Some(errors) if !errors.is_empty() => {
                Classification::Terminal(ClientError::from_graphql_errors(&errors))
            }
            _ => Classification::Data(payload.data.unwrap_or_default()),
        },
        ServerFrame::Data(None) => {
            Classification::Terminal(ClientError::MissingPayload("data".to_string()))
        }
        other => {
            Classification::Terminal(ClientError::UnknownMessageType(other.type_name().to_string()))
        }
    }
}

/// Checks that the first frame after `connection_init` is `connection_ack`.
///
/// Only the `type` field is decoded.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the frame has no string `type`, or
/// [`ClientError::HandshakeRejected`] if the type is anything else.
pub fn expect_ack(frame: &[u8]) -> Result<(), ClientError> {
    match ServerFrame::decode_type(frame)? {
        ServerFrame::ConnectionAck => Ok(()),
        other => Err(ClientError::HandshakeRejected(other.type_name().to_string())),
    }
}
