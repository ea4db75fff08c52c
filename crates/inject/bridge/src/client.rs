use crate::{
    error::{BridgeError, Result},
    id::IdGenerator,
    table::{CorrelationTable, PendingEntry, Route, Subscriber},
    transport::{InboundMessage, MessageSource, Transport},
};
use inject_rpc::{MessageType, Origins, ProviderError, RequestEnvelope, ResponseEnvelope};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};
use tokio::sync::oneshot;

/// Sends requests to the wallet relay and routes its deliveries back to the callers.
///
/// Cloning is cheap, clones share the transport and the correlation table.
#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    transport: Box<dyn Transport>,
    origins: Origins,
    ids: IdGenerator,
    pending: Mutex<CorrelationTable>,
}

/// Outcome of a single inbound delivery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Rejected by the source/origin filter, or not an envelope
    Dropped,
    /// No pending call with this id
    Unknown,
    /// A subscriber received a push
    Notified,
    /// A pending call resolved
    Resolved,
    /// A pending call was rejected
    Rejected,
    /// The call had already settled
    Ignored,
}

// === impl BridgeClient ===

impl BridgeClient {
    /// Creates a new client posting through the given transport.
    ///
    /// `id_prefix` identifies the installation and prefixes every correlation id.
    pub fn new(
        transport: impl Transport + 'static,
        origins: Origins,
        id_prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                transport: Box::new(transport),
                origins,
                ids: IdGenerator::new(id_prefix),
                pending: Mutex::new(CorrelationTable::new()),
            }),
        }
    }

    /// The origin tags this client sends with and accepts
    pub fn origins(&self) -> &Origins {
        &self.inner.origins
    }

    /// Sends a request to the relay.
    ///
    /// The envelope is posted before this returns, the returned future only waits for the
    /// answer. When a `subscriber` is given, the pending entry outlives the answer and every
    /// later subscription push for the id is passed to the subscriber.
    pub fn send_message(
        &self,
        message: &str,
        request: Option<Value>,
        subscriber: Option<Subscriber>,
    ) -> PendingResponse {
        let id = self.inner.ids.next_id();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(id.clone(), PendingEntry::new(message, tx, subscriber));

        let envelope = RequestEnvelope::new(&id, message, &self.inner.origins.page, request);
        let kind = MessageType::of(message);
        if !kind.is_page_callable() {
            warn!(target: "inject::bridge", %id, message, %kind, "method is not page callable");
        }
        trace!(target: "inject::bridge", %id, message, %kind, "sending request");

        if let Err(err) = self.inner.transport.post(&envelope) {
            warn!(target: "inject::bridge", %id, message, %err, "failed to post request");
            self.inner.pending.lock().remove(&id);
            return PendingResponse::failed(id, err.into());
        }

        PendingResponse::waiting(id, rx)
    }

    /// Sends a one-shot request
    pub fn send(&self, message: &str, request: Option<Value>) -> PendingResponse {
        self.send_message(message, request, None)
    }

    /// Sends a subscribing request, `subscriber` receives every push
    pub fn subscribe<F>(
        &self,
        message: &str,
        request: Option<Value>,
        subscriber: F,
    ) -> PendingResponse
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.send_message(message, request, Some(Arc::new(subscriber)))
    }

    /// Entry point for inbound message events.
    ///
    /// Only messages posted by the page's own window and tagged with the relay's origin are
    /// accepted, everything else is dropped without surfacing to any caller.
    pub fn handle_message(&self, message: InboundMessage) -> Delivery {
        let InboundMessage { source, data } = message;

        let origin = data.get("origin").and_then(Value::as_str);
        let expected = self.inner.origins.content.as_str();
        if source != MessageSource::SameWindow || origin != Some(expected) {
            trace!(target: "inject::bridge", ?source, ?origin, "dropping foreign message");
            return Delivery::Dropped;
        }

        if !data.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty()) {
            error!(target: "inject::bridge", "missing id for response");
            return Delivery::Dropped;
        }

        match serde_json::from_value::<ResponseEnvelope>(data) {
            Ok(envelope) => self.dispatch(envelope),
            Err(err) => {
                warn!(target: "inject::bridge", %err, "dropping malformed response envelope");
                Delivery::Dropped
            }
        }
    }

    /// Routes an already validated envelope to its pending call
    pub fn dispatch(&self, envelope: ResponseEnvelope) -> Delivery {
        let id = envelope.id.clone();
        // the lock must be released before any subscriber runs, subscribers may send again
        let route = self.inner.pending.lock().route(envelope);

        match route {
            Route::Unknown => {
                debug!(target: "inject::bridge", %id, "unknown response");
                Delivery::Unknown
            }
            Route::Notify(subscriber, update) => {
                trace!(target: "inject::bridge", %id, "subscription update");
                subscriber(update);
                Delivery::Notified
            }
            Route::Settle(responder, result) => {
                let delivery = if result.is_ok() { Delivery::Resolved } else { Delivery::Rejected };
                trace!(target: "inject::bridge", %id, ?delivery, "settling request");
                // the caller may have dropped the future, that is fine
                let _ = responder.send(result);
                delivery
            }
            Route::Settled => Delivery::Ignored,
        }
    }

    /// Removes the pending entry of a call, e.g. once its subscription was cancelled
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.inner.pending.lock().remove(id);
        if removed {
            trace!(target: "inject::bridge", %id, "removed pending entry");
        }
        removed
    }

    /// Drops every pending call.
    ///
    /// Callers still waiting observe [`BridgeError::Closed`], subscribers receive nothing further.
    pub fn teardown(&self) -> usize {
        let count = self.inner.pending.lock().clear();
        debug!(target: "inject::bridge", count, "tore down pending requests");
        count
    }

    /// Number of pending entries
    pub fn pending(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Whether a pending entry exists for the id
    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.pending.lock().contains(id)
    }
}

impl fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeClient")
            .field("origins", &self.inner.origins)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// The answer to a request that has already been posted
#[derive(Debug)]
pub struct PendingResponse {
    id: String,
    state: ResponseState,
}

#[derive(Debug)]
enum ResponseState {
    Waiting(oneshot::Receiver<Result<Value, ProviderError>>),
    Failed(Option<BridgeError>),
}

// === impl PendingResponse ===

impl PendingResponse {
    fn waiting(id: String, rx: oneshot::Receiver<Result<Value, ProviderError>>) -> Self {
        Self { id, state: ResponseState::Waiting(rx) }
    }

    fn failed(id: String, err: BridgeError) -> Self {
        Self { id, state: ResponseState::Failed(Some(err)) }
    }

    /// The correlation id of the request
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the answer and deserializes it
    pub async fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl Future for PendingResponse {
    type Output = Result<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            ResponseState::Waiting(rx) => Poll::Ready(match ready!(Pin::new(rx).poll(cx)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(BridgeError::Provider(err)),
                Err(_) => Err(BridgeError::Closed),
            }),
            ResponseState::Failed(err) => {
                Poll::Ready(Err(err.take().unwrap_or(BridgeError::Closed)))
            }
        }
    }
}
