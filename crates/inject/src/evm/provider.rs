use super::events::{EvmEvent, RelayEvent};
use crate::{
    config::InjectConfig,
    emitter::{EventEmitter, Listener},
    spawn_detached,
    substrate::types::AccountAuthType,
    to_request,
};
use alloy_primitives::{Address, U64};
use inject_bridge::{BridgeClient, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

/// Arguments of an EIP-1193 `request`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), params: None }
    }

    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// EIP-1193 provider backed by the wallet.
///
/// Cloning yields another handle to the same provider, [`Self::clone_provider`] creates a fresh
/// one.
#[derive(Clone)]
pub struct EvmProvider {
    inner: Arc<EvmInner>,
}

struct EvmInner {
    client: BridgeClient,
    config: Arc<InjectConfig>,
    /// the name the page authorizes under
    dapp_origin: String,
    connected: AtomicBool,
    /// whether `evm(events.subscribe)` was issued
    subscribed: AtomicBool,
    events: EventEmitter<Value>,
}

// === impl EvmProvider ===

impl EvmProvider {
    pub fn new(
        client: BridgeClient,
        config: Arc<InjectConfig>,
        dapp_origin: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(EvmInner {
                client,
                config,
                dapp_origin: dapp_origin.into(),
                connected: AtomicBool::new(true),
                subscribed: AtomicBool::new(false),
                events: EventEmitter::new(),
            }),
        }
    }

    /// A fresh provider over the same bridge: connected, without listeners or event subscription
    pub fn clone_provider(&self) -> Self {
        Self::new(
            self.inner.client.clone(),
            self.inner.config.clone(),
            self.inner.dapp_origin.clone(),
        )
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    pub fn connected(&self) -> bool {
        self.is_connected()
    }

    pub fn is_metamask(&self) -> bool {
        false
    }

    /// The configured extension version
    pub fn version(&self) -> Option<&str> {
        self.inner.config.version.as_deref()
    }

    pub(crate) fn config(&self) -> &InjectConfig {
        &self.inner.config
    }

    /// Whether the wallet's event subscription was issued
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscribed.load(Ordering::SeqCst)
    }

    /// Performs an EIP-1193 request.
    ///
    /// `eth_requestAccounts` first authorizes the page, then subscribes to the wallet's events and
    /// answers with `eth_accounts`. A failed authorization aborts the flow.
    pub async fn request(&self, args: RequestArguments) -> Result<Value> {
        if args.method == "eth_requestAccounts" {
            let authorize = json!({
                "origin": self.inner.dapp_origin,
                "accountAuthType": AccountAuthType::Evm,
            });
            self.inner.client.send("pub(authorize.tabV2)", Some(authorize)).await?;
            self.subscribe_extension_events();
            return self.forward(RequestArguments::new("eth_accounts")).await;
        }
        self.forward(args).await
    }

    async fn forward(&self, args: RequestArguments) -> Result<Value> {
        trace!(target: "inject::evm", method = %args.method, "forwarding request");
        self.inner.client.send("evm(request)", Some(to_request(&args)?)).await
    }

    /// Shorthand for `eth_requestAccounts`
    pub async fn enable(&self) -> Result<Value> {
        self.request(RequestArguments::new("eth_requestAccounts")).await
    }

    /// The accounts the page may access
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let accounts = self.request(RequestArguments::new("eth_accounts")).await?;
        Ok(serde_json::from_value(accounts)?)
    }

    /// The chain id of the selected network
    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.request(RequestArguments::new("eth_chainId")).await?;
        Ok(serde_json::from_value::<U64>(chain_id)?.to())
    }

    /// Registers a listener, the first registration subscribes to the wallet's events
    pub fn on<F>(&self, event: &str, handler: F) -> Listener
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let listener = self.inner.events.on(event, handler);
        self.subscribe_extension_events();
        listener
    }

    /// Registers a listener for the next emission only
    pub fn once<F>(&self, event: &str, handler: F) -> Listener
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let listener = self.inner.events.once(event, handler);
        self.subscribe_extension_events();
        listener
    }

    pub fn remove_listener(&self, listener: &Listener) -> bool {
        self.inner.events.remove_listener(listener)
    }

    /// Removes every listener of `event`, returns how many were removed
    pub fn remove_all_listeners(&self, event: &str) -> usize {
        self.inner.events.remove_all_listeners(event)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.events.listener_count(event)
    }

    /// Subscribes to the wallet's events, at most once per provider.
    ///
    /// The flag is reset only if the subscribing call itself fails.
    fn subscribe_extension_events(&self) {
        if self.inner.subscribed.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let pending = self.inner.client.subscribe("evm(events.subscribe)", None, move |update| {
            if let Some(inner) = weak.upgrade() {
                inner.relay_event(update);
            }
        });

        let id = pending.id().to_string();
        let weak: Weak<EvmInner> = Arc::downgrade(&self.inner);
        spawn_detached(async move {
            if let Err(err) = pending.await {
                warn!(target: "inject::evm", %err, "failed to subscribe to wallet events");
                if let Some(inner) = weak.upgrade() {
                    inner.client.remove(&id);
                    inner.subscribed.store(false, Ordering::SeqCst);
                }
            }
        });
    }
}

impl EvmInner {
    fn relay_event(&self, update: Value) {
        let RelayEvent { ty, payload } = match serde_json::from_value(update) {
            Ok(event) => event,
            Err(err) => {
                warn!(target: "inject::evm", %err, "malformed wallet event");
                return;
            }
        };

        let Some(event) = EvmEvent::from_relay(&ty) else {
            warn!(target: "inject::evm", %ty, ?payload, "Can not handle event");
            return;
        };

        match event {
            EvmEvent::Connect => self.connected.store(true, Ordering::SeqCst),
            EvmEvent::Disconnect => self.connected.store(false, Ordering::SeqCst),
            _ => {}
        }

        trace!(target: "inject::evm", %event, "emitting wallet event");
        self.events.emit(event.as_str(), &payload);
    }
}

impl fmt::Debug for EvmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmProvider")
            .field("connected", &self.is_connected())
            .field("subscribed", &self.is_subscribed())
            .field("dapp_origin", &self.inner.dapp_origin)
            .finish_non_exhaustive()
    }
}
