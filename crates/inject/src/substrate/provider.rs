//! The RPC provider handed to chain libraries, backed by a provider running in the wallet

use super::types::{ProviderEvent, ProviderMeta};
use crate::{
    emitter::{EventEmitter, Listener},
    spawn_detached,
};
use inject_bridge::{BridgeClient, Result};
use inject_rpc::{SubscriptionId, SubscriptionKey};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Receives every update of an RPC subscription
pub type SubscriptionCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Turns a call into a subscription, see [`RpcProvider::send`]
#[derive(Clone)]
pub struct SubscriptionHandler {
    /// subscription type, e.g. `chain_newHead`
    pub ty: String,
    pub callback: SubscriptionCallback,
}

impl SubscriptionHandler {
    pub fn new<F>(ty: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self { ty: ty.into(), callback: Arc::new(callback) }
    }
}

impl fmt::Debug for SubscriptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandler").field("ty", &self.ty).finish_non_exhaustive()
    }
}

/// Provider forwarding RPC calls to a provider started in the wallet
pub struct RpcProvider {
    client: BridgeClient,
    state: Arc<ProviderState>,
}

struct ProviderState {
    /// whether the wallet's provider is connected to its node
    connected: AtomicBool,
    events: EventEmitter<()>,
    /// correlation ids of the subscribing calls, keyed by type and subscription id
    subscriptions: Mutex<HashMap<SubscriptionKey, String>>,
}

// === impl RpcProvider ===

impl RpcProvider {
    pub fn new(client: BridgeClient) -> Self {
        Self {
            client,
            state: Arc::new(ProviderState {
                connected: AtomicBool::new(false),
                events: EventEmitter::new(),
                subscriptions: Default::default(),
            }),
        }
    }

    /// A fresh provider over the same bridge, without listeners or subscriptions
    pub fn clone_provider(&self) -> Self {
        Self::new(self.client.clone())
    }

    /// Connecting is controlled by the wallet, this only logs
    pub async fn connect(&self) -> Result<()> {
        error!(target: "inject::rpc", "RpcProvider::connect() is not implemented");
        Ok(())
    }

    /// Disconnecting is controlled by the wallet, this only logs
    pub async fn disconnect(&self) -> Result<()> {
        error!(target: "inject::rpc", "RpcProvider::disconnect() is not implemented");
        Ok(())
    }

    pub fn has_subscriptions(&self) -> bool {
        true
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// The providers the wallet can start, keyed by name
    pub async fn list_providers(&self) -> Result<HashMap<String, ProviderMeta>> {
        self.client.send("pub(rpc.listProviders)", None).decode().await
    }

    /// Registers a listener for a provider event
    pub fn on<F>(&self, event: ProviderEvent, handler: F) -> Listener
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.state.events.on(event.as_str(), move |_| handler())
    }

    /// Sends an RPC call.
    ///
    /// With a `subscription` the call subscribes: it resolves with the subscription id and the
    /// handler's callback receives every update until [`Self::unsubscribe`].
    pub async fn send(
        &self,
        method: &str,
        params: Value,
        subscription: Option<SubscriptionHandler>,
    ) -> Result<Value> {
        let Some(SubscriptionHandler { ty, callback }) = subscription else {
            return self
                .client
                .send("pub(rpc.send)", Some(json!({ "method": method, "params": params })))
                .await;
        };

        let pending = self.client.send_message(
            "pub(rpc.subscribe)",
            Some(json!({ "method": method, "params": params, "type": ty })),
            Some(callback),
        );
        let request_id = pending.id().to_string();
        let id = match pending.await {
            Ok(id) => id,
            Err(err) => {
                self.client.remove(&request_id);
                return Err(err);
            }
        };

        match serde_json::from_value::<SubscriptionId>(id.clone()) {
            Ok(sub_id) => {
                let key = SubscriptionKey::new(&ty, &sub_id);
                trace!(target: "inject::rpc", %key, "subscribed");
                self.state.subscriptions.lock().insert(key, request_id);
            }
            Err(err) => warn!(target: "inject::rpc", %err, ?id, "unexpected subscription id"),
        }

        Ok(id)
    }

    /// Subscribes to `method`, see [`Self::send`]
    pub async fn subscribe<F>(
        &self,
        ty: &str,
        method: &str,
        params: Value,
        callback: F,
    ) -> Result<Value>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.send(method, params, Some(SubscriptionHandler::new(ty, callback))).await
    }

    /// Cancels a subscription made with [`Self::subscribe`].
    ///
    /// Resolves with `false` without contacting the wallet when there is no such subscription,
    /// otherwise with the wallet's answer to `method`. The wallet's confirmation is best effort:
    /// a failed `method` call is logged, resolves with `null` and still cancels locally.
    pub async fn unsubscribe(&self, ty: &str, method: &str, id: &SubscriptionId) -> Result<Value> {
        let key = SubscriptionKey::new(ty, id);
        let Some(request_id) = self.state.subscriptions.lock().remove(&key) else {
            debug!(target: "inject::rpc", %key, "Unable to find active subscription");
            return Ok(Value::Bool(false));
        };

        let res = self.send(method, json!([id]), None).await;
        // late updates for the cancelled subscription are dropped from here on
        self.client.remove(&request_id);
        match res {
            Ok(res) => Ok(res),
            Err(err) => {
                warn!(target: "inject::rpc", %err, %key, "unsubscribe was not confirmed");
                Ok(Value::Null)
            }
        }
    }

    /// Whether a subscription is tracked for the type and id
    pub fn is_subscribed(&self, ty: &str, id: &SubscriptionId) -> bool {
        self.state.subscriptions.lock().contains_key(&SubscriptionKey::new(ty, id))
    }

    /// Starts the provider `key` in the wallet.
    ///
    /// The provider counts as disconnected until the wallet reports the connection, every later
    /// connectivity change is emitted as [`ProviderEvent::Connected`] or
    /// [`ProviderEvent::Disconnected`]. If the wallet refuses the connectivity subscription,
    /// [`ProviderEvent::Error`] is emitted.
    pub async fn start_provider(&self, key: &str) -> Result<ProviderMeta> {
        self.state.connected.store(false, Ordering::SeqCst);
        self.state.events.emit(ProviderEvent::Disconnected.as_str(), &());

        let meta = self.client.send("pub(rpc.startProvider)", Some(json!(key))).decode().await?;

        let state = Arc::downgrade(&self.state);
        let pending = self.client.subscribe("pub(rpc.subscribeConnected)", None, move |update| {
            let Some(state) = state.upgrade() else { return };
            let connected = is_truthy(&update);
            state.connected.store(connected, Ordering::SeqCst);
            let event =
                if connected { ProviderEvent::Connected } else { ProviderEvent::Disconnected };
            state.events.emit(event.as_str(), &());
        });
        let client = self.client.clone();
        let state = Arc::downgrade(&self.state);
        let request_id = pending.id().to_string();
        spawn_detached(async move {
            if let Err(err) = pending.await {
                warn!(target: "inject::rpc", %err, "failed to subscribe to provider connectivity");
                client.remove(&request_id);
                if let Some(state) = state.upgrade() {
                    state.events.emit(ProviderEvent::Error.as_str(), &());
                }
            }
        });

        Ok(meta)
    }
}

impl fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcProvider")
            .field("connected", &self.is_connected())
            .field("subscriptions", &self.state.subscriptions.lock().len())
            .finish_non_exhaustive()
    }
}

/// Loose truthiness of a pushed connectivity flag
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
