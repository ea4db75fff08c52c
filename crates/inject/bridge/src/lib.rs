//! # inject-bridge
//!
//! The page side of the injected provider bridge.
//!
//! When a provider facade calls into the wallet:
//!  - the [`BridgeClient`] assigns a fresh correlation id and registers a pending continuation
//!  - the request envelope is handed to a [`Transport`], which relays it to the wallet
//!  - responses come back through [`BridgeClient::handle_message`], are filtered by origin and
//!    matched to the continuation by id
//!  - one-shot calls settle once, subscribing calls keep receiving pushes until removed

#[macro_use]
extern crate tracing;

mod client;
pub mod error;
pub mod id;
pub mod table;
pub mod transport;

pub use client::{BridgeClient, Delivery, PendingResponse};
pub use error::{BridgeError, Result};
pub use id::IdGenerator;
pub use table::{CorrelationTable, PendingEntry, Subscriber};
pub use transport::{ChannelTransport, InboundMessage, MessageSource, Transport, TransportError};

/// Re-export of the wire types
pub use inject_rpc as rpc;
