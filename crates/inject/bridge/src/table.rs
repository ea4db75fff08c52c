//! Correlation of relay deliveries to pending calls

use inject_rpc::{ProviderError, ResponseEnvelope, ResponsePayload};
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::oneshot;

/// Callback invoked for every subscription push of a call
pub type Subscriber = Arc<dyn Fn(Value) + Send + Sync>;

/// Settles the caller's future
pub(crate) type Responder = oneshot::Sender<Result<Value, ProviderError>>;

/// Continuation of a call that has been sent but not settled
pub struct PendingEntry {
    /// the method, kept for diagnostics
    message: String,
    /// `None` once the call has settled
    responder: Option<Responder>,
    subscriber: Option<Subscriber>,
}

impl PendingEntry {
    pub(crate) fn new(
        message: impl Into<String>,
        responder: Responder,
        subscriber: Option<Subscriber>,
    ) -> Self {
        Self { message: message.into(), responder: Some(responder), subscriber }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_subscription(&self) -> bool {
        self.subscriber.is_some()
    }

    pub fn is_settled(&self) -> bool {
        self.responder.is_none()
    }
}

impl fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEntry")
            .field("message", &self.message)
            .field("settled", &self.is_settled())
            .field("subscription", &self.is_subscription())
            .finish()
    }
}

/// What has to happen for a delivery, executed by the caller outside of any lock
pub(crate) enum Route {
    /// No pending entry for the id
    Unknown,
    /// Invoke the subscriber with the update
    Notify(Subscriber, Value),
    /// Settle the pending call
    Settle(Responder, Result<Value, ProviderError>),
    /// The entry exists but already settled, nothing to do
    Settled,
}

/// Pending calls keyed by correlation id.
///
/// One-shot entries are consumed by their first delivery. Entries of subscribing calls survive
/// their settlement and are only removed explicitly.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: HashMap<String, PendingEntry>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: String, entry: PendingEntry) {
        if self.entries.insert(id.clone(), entry).is_some() {
            warn!(target: "inject::bridge", %id, "replaced pending entry with duplicate id");
        }
    }

    /// Removes the entry, returns whether there was one
    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&PendingEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry, returns how many were pending
    pub fn clear(&mut self) -> usize {
        let len = self.entries.len();
        self.entries.clear();
        len
    }

    /// Resolves what a delivery means for its pending entry
    pub(crate) fn route(&mut self, envelope: ResponseEnvelope) -> Route {
        let id = envelope.id.clone();
        let Some(entry) = self.entries.get_mut(&id) else { return Route::Unknown };

        match (envelope.into_payload(), entry.subscriber.clone()) {
            (ResponsePayload::Subscription(update), Some(subscriber)) => {
                Route::Notify(subscriber, update)
            }
            (payload, Some(_)) => match entry.responder.take() {
                Some(responder) => Route::Settle(responder, into_result(payload)),
                None => Route::Settled,
            },
            (payload, None) => match self.entries.remove(&id).and_then(|entry| entry.responder) {
                Some(responder) => Route::Settle(responder, into_result(payload)),
                None => Route::Settled,
            },
        }
    }
}

fn into_result(payload: ResponsePayload) -> Result<Value, ProviderError> {
    match payload {
        ResponsePayload::Response(value) => Ok(value),
        ResponsePayload::Error(err) => Err(err),
        ResponsePayload::Subscription(_) => Err(ProviderError::internal_error()
            .with_message("received a subscription push for a one-shot call")),
    }
}
