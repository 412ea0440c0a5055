//! `graphql-ws` wire protocol: frame types and inbound classification.
//!
//! Nothing in this module performs I/O. [`messages`] defines the JSON
//! frames exchanged with the server and [`classifier`] turns raw inbound
//! frames into the outcomes the dispatch loop acts on.

pub mod classifier;
pub mod messages;

pub use classifier::{Classification, classify, expect_ack};
pub use messages::{ClientFrame, DataPayload, GRAPHQL_WS_PROTOCOL, ServerFrame, SUBSCRIPTION_ID};
