//! Envelope transport between the page and the relay

use inject_rpc::RequestEnvelope;
use serde_json::Value;
use tokio::sync::mpsc;

/// Hands request envelopes to the relay.
///
/// Posting is fire-and-forget: answers arrive later through
/// [`BridgeClient::handle_message`](crate::BridgeClient::handle_message). Implementations must
/// keep the order of accepted envelopes and must not drop or duplicate them silently.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait Transport: Send + Sync {
    fn post(&self, envelope: &RequestEnvelope) -> Result<(), TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where an inbound message came from, as reported by the host environment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageSource {
    /// The page's own window, where the relay's content script posts its answers
    SameWindow,
    /// Another frame or window
    Foreign,
}

/// An inbound message event, not yet validated
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    pub source: MessageSource,
    pub data: Value,
}

impl InboundMessage {
    pub fn same_window(data: Value) -> Self {
        Self { source: MessageSource::SameWindow, data }
    }

    pub fn foreign(data: Value) -> Self {
        Self { source: MessageSource::Foreign, data }
    }
}

/// A [`Transport`] that forwards envelopes over an unbounded channel.
///
/// The host drains the receiver and relays the envelopes to the wallet.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<RequestEnvelope>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RequestEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn post(&self, envelope: &RequestEnvelope) -> Result<(), TransportError> {
        self.tx.send(envelope.clone()).map_err(|_| TransportError::Closed)
    }
}
