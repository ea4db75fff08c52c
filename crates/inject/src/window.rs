//! In-process model of the page window the providers are injected into.
//!
//! The window is the only channel between page scripts and the wallet relay: requests and
//! answers are both posted as same-window `message` events, providers are published as global
//! properties and announced through named events.

use crate::{
    emitter::{EventEmitter, Listener},
    evm::{EvmProvider, ProviderDetail},
    substrate::Extension,
};
use inject_bridge::{BridgeClient, InboundMessage, Transport, TransportError};
use inject_rpc::RequestEnvelope;
use parking_lot::RwLock;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

/// Event carrying posted messages
pub const MESSAGE_EVENT: &str = "message";

/// Event fired once the page finished loading
pub const LOAD_EVENT: &str = "load";

/// Global property of the conventional EVM provider
pub const ETHEREUM_GLOBAL: &str = "ethereum";

/// Payload of a window event
#[derive(Clone, Debug)]
pub enum WindowEvent {
    /// A posted message
    Message(InboundMessage),
    /// An EIP-6963 provider announcement
    AnnounceProvider(Arc<ProviderDetail>),
    /// An event without payload
    Signal,
}

/// A global property of the window
#[derive(Clone, Debug)]
pub enum Global {
    /// An EVM provider
    Provider(EvmProvider),
    /// A proxy installed ahead of the provider, it forwards to whatever provider it is handed
    Slot(ProviderSlot),
    /// Anything else
    Value(Value),
}

/// A provider proxy installed before the injection ran
#[derive(Clone, Debug, Default)]
pub struct ProviderSlot {
    provider: Arc<RwLock<Option<EvmProvider>>>,
}

impl ProviderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, provider: EvmProvider) {
        *self.provider.write() = Some(provider);
    }

    pub fn provider(&self) -> Option<EvmProvider> {
        self.provider.read().clone()
    }
}

/// An entry of the `injectedWeb3` registry
#[derive(Clone, Debug)]
pub struct InjectedExtension {
    pub version: String,
    pub enable: Extension,
}

/// The page window.
///
/// Cloning yields another handle to the same window.
#[derive(Clone)]
pub struct LocalWindow {
    inner: Arc<WindowInner>,
}

struct WindowInner {
    title: String,
    hostname: String,
    loaded: AtomicBool,
    globals: RwLock<HashMap<String, Global>>,
    injected_web3: RwLock<BTreeMap<String, InjectedExtension>>,
    events: EventEmitter<WindowEvent>,
}

// === impl LocalWindow ===

impl LocalWindow {
    /// A window showing a page of the given host, not yet loaded
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::with_title(hostname, "")
    }

    pub fn with_title(hostname: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(WindowInner {
                title: title.into(),
                hostname: hostname.into(),
                loaded: AtomicBool::new(false),
                globals: Default::default(),
                injected_web3: Default::default(),
                events: EventEmitter::new(),
            }),
        }
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn hostname(&self) -> &str {
        &self.inner.hostname
    }

    /// The name the page authorizes under: the document title, or the hostname without one
    pub fn dapp_origin(&self) -> &str {
        if self.inner.title.is_empty() { &self.inner.hostname } else { &self.inner.title }
    }

    pub fn downgrade(&self) -> WeakWindow {
        WeakWindow { inner: Arc::downgrade(&self.inner) }
    }

    pub fn global(&self, name: &str) -> Option<Global> {
        self.inner.globals.read().get(name).cloned()
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.inner.globals.read().contains_key(name)
    }

    pub fn set_global(&self, name: impl Into<String>, value: Global) {
        self.inner.globals.write().insert(name.into(), value);
    }

    /// Resolves a global to an EVM provider, following a proxy slot
    pub fn evm_provider(&self, name: &str) -> Option<EvmProvider> {
        match self.global(name)? {
            Global::Provider(provider) => Some(provider),
            Global::Slot(slot) => slot.provider(),
            Global::Value(_) => None,
        }
    }

    /// A snapshot of the `injectedWeb3` registry
    pub fn injected_web3(&self) -> BTreeMap<String, InjectedExtension> {
        self.inner.injected_web3.read().clone()
    }

    pub fn injected_extension(&self, name: &str) -> Option<InjectedExtension> {
        self.inner.injected_web3.read().get(name).cloned()
    }

    /// Adds or replaces a single entry of the `injectedWeb3` registry
    pub fn register_extension(&self, name: impl Into<String>, extension: InjectedExtension) {
        self.inner.injected_web3.write().insert(name.into(), extension);
    }

    pub fn add_event_listener<F>(&self, event: &str, handler: F) -> Listener
    where
        F: Fn(&WindowEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(event, handler)
    }

    pub fn add_event_listener_once<F>(&self, event: &str, handler: F) -> Listener
    where
        F: Fn(&WindowEvent) + Send + Sync + 'static,
    {
        self.inner.events.once(event, handler)
    }

    pub fn remove_event_listener(&self, listener: &Listener) -> bool {
        self.inner.events.remove_listener(listener)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.events.listener_count(event)
    }

    /// Dispatches an event to every listener, returns whether there were any
    pub fn dispatch_event(&self, event: &str, payload: &WindowEvent) -> bool {
        trace!(target: "inject::window", event, "dispatching event");
        self.inner.events.emit(event, payload)
    }

    /// Posts a message from a script of this window
    pub fn post_message(&self, data: Value) {
        let message = InboundMessage::same_window(data);
        self.dispatch_event(MESSAGE_EVENT, &WindowEvent::Message(message));
    }

    /// Delivers a message posted by another frame or window
    pub fn receive_foreign(&self, data: Value) {
        let message = InboundMessage::foreign(data);
        self.dispatch_event(MESSAGE_EVENT, &WindowEvent::Message(message));
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::SeqCst)
    }

    /// Marks the page as loaded and fires `load`, only the first call has an effect
    pub fn load(&self) {
        if !self.inner.loaded.swap(true, Ordering::SeqCst) {
            self.dispatch_event(LOAD_EVENT, &WindowEvent::Signal);
        }
    }
}

impl fmt::Debug for LocalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWindow")
            .field("hostname", &self.inner.hostname)
            .field("title", &self.inner.title)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

/// A handle that does not keep the window alive
#[derive(Clone, Debug)]
pub struct WeakWindow {
    inner: Weak<WindowInner>,
}

impl WeakWindow {
    pub fn upgrade(&self) -> Option<LocalWindow> {
        self.inner.upgrade().map(|inner| LocalWindow { inner })
    }
}

/// Posts request envelopes as same-window messages, for the content script to pick up
#[derive(Clone, Debug)]
pub struct WindowTransport {
    window: WeakWindow,
}

impl WindowTransport {
    pub fn new(window: &LocalWindow) -> Self {
        Self { window: window.downgrade() }
    }
}

impl Transport for WindowTransport {
    fn post(&self, envelope: &RequestEnvelope) -> Result<(), TransportError> {
        let window = self.window.upgrade().ok_or(TransportError::Closed)?;
        window.post_message(serde_json::to_value(envelope)?);
        Ok(())
    }
}

/// Feeds every `message` event of the window into the client
pub fn listen(window: &LocalWindow, client: BridgeClient) -> Listener {
    window.add_event_listener(MESSAGE_EVENT, move |event| {
        if let WindowEvent::Message(message) = event {
            client.handle_message(message.clone());
        }
    })
}
