//! EIP-6963 multi provider discovery.
//!
//! See also <https://eips.ethereum.org/EIPS/eip-6963>

use super::provider::{EvmProvider, RequestArguments};
use crate::{
    emitter::{Handler, Listener},
    window::{LocalWindow, WindowEvent},
};
use futures::future::BoxFuture;
use inject_bridge::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};
use uuid::Uuid;

/// Event announcing a provider
pub const ANNOUNCE_PROVIDER_EVENT: &str = "eip6963:announceProvider";

/// Event asking every provider to announce itself
pub const REQUEST_PROVIDER_EVENT: &str = "eip6963:requestProvider";

/// Identifies an announced provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// unique per provider instance
    pub uuid: Uuid,
    pub name: String,
    /// a data URI
    pub icon: String,
    /// reverse domain name of the wallet
    pub rdns: String,
}

impl ProviderInfo {
    /// Creates the info with a fresh v4 uuid
    pub fn new(name: impl Into<String>, icon: impl Into<String>, rdns: impl Into<String>) -> Self {
        Self { uuid: Uuid::new_v4(), name: name.into(), icon: icon.into(), rdns: rdns.into() }
    }
}

/// The stable EIP-1193 surface handed to discovering scripts
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait Eip1193: Send + Sync {
    fn request(&self, args: RequestArguments) -> BoxFuture<'_, Result<Value>>;

    fn on(&self, event: &str, handler: Handler<Value>) -> Listener;

    fn remove_listener(&self, listener: &Listener) -> bool;

    fn is_connected(&self) -> bool;
}

impl Eip1193 for EvmProvider {
    fn request(&self, args: RequestArguments) -> BoxFuture<'_, Result<Value>> {
        Box::pin(Self::request(self, args))
    }

    fn on(&self, event: &str, handler: Handler<Value>) -> Listener {
        Self::on(self, event, move |payload| handler(payload))
    }

    fn remove_listener(&self, listener: &Listener) -> bool {
        Self::remove_listener(self, listener)
    }

    fn is_connected(&self) -> bool {
        Self::is_connected(self)
    }
}

/// The payload of an announcement
#[derive(Clone)]
pub struct ProviderDetail {
    pub info: ProviderInfo,
    pub provider: Arc<dyn Eip1193>,
}

impl ProviderDetail {
    pub fn new(info: ProviderInfo, provider: impl Eip1193 + 'static) -> Self {
        Self { info, provider: Arc::new(provider) }
    }
}

impl fmt::Debug for ProviderDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDetail").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Announces the provider now and again on every discovery request.
///
/// The returned listener stops the re-announcements once removed.
pub fn announce_provider(window: &LocalWindow, detail: ProviderDetail) -> Listener {
    let event = WindowEvent::AnnounceProvider(Arc::new(detail));
    window.dispatch_event(ANNOUNCE_PROVIDER_EVENT, &event);

    let weak = window.downgrade();
    window.add_event_listener(REQUEST_PROVIDER_EVENT, move |_| {
        if let Some(window) = weak.upgrade() {
            trace!(target: "inject::window", "re-announcing provider");
            window.dispatch_event(ANNOUNCE_PROVIDER_EVENT, &event);
        }
    })
}

/// Asks every provider in the window to announce itself, what a discovering page does
pub fn request_providers(window: &LocalWindow) {
    window.dispatch_event(REQUEST_PROVIDER_EVENT, &WindowEvent::Signal);
}
