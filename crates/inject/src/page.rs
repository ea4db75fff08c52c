//! Publishing the providers to the page

use crate::{
    config::InjectConfig,
    emitter::Listener,
    evm::{EvmProvider, ProviderDetail, announce_provider},
    substrate::Extension,
    window::{
        ETHEREUM_GLOBAL, Global, InjectedExtension, LOAD_EVENT, LocalWindow, WindowEvent,
        WindowTransport, listen,
    },
};
use inject_bridge::BridgeClient;
use std::sync::Arc;

/// Adds the extension to `injectedWeb3` under `name`, keeping every other entry
pub fn inject_extension(window: &LocalWindow, name: &str, version: &str, extension: Extension) {
    debug!(target: "inject::window", name, version, "registering extension");
    window.register_extension(
        name,
        InjectedExtension { version: version.to_string(), enable: extension },
    );
}

/// Exposes the EVM provider under the configured global.
///
/// A proxy already installed under that global is handed the provider instead of being replaced.
/// `<global>#initialized` fires right away. Once the page has loaded, the provider also becomes
/// `ethereum` unless another provider claimed it, and `ethereum#initialized` fires.
pub fn inject_evm_provider(window: &LocalWindow, provider: EvmProvider, config: &InjectConfig) {
    let global = config.evm_global.as_str();
    match window.global(global) {
        Some(Global::Slot(slot)) => slot.set(provider.clone()),
        _ => window.set_global(global, Global::Provider(provider.clone())),
    }
    window.dispatch_event(&format!("{global}#initialized"), &WindowEvent::Signal);

    let publish = move |window: &LocalWindow| {
        if window.has_global(ETHEREUM_GLOBAL) {
            debug!(target: "inject::window", "ethereum is already provided, not replacing it");
            return;
        }
        window.set_global(ETHEREUM_GLOBAL, Global::Provider(provider.clone()));
        window.dispatch_event("ethereum#initialized", &WindowEvent::Signal);
    };

    if window.is_loaded() {
        publish(window);
    } else {
        let weak = window.downgrade();
        window.add_event_listener_once(LOAD_EVENT, move |_| {
            if let Some(window) = weak.upgrade() {
                publish(&window);
            }
        });
    }
}

/// Everything [`inject`] installed into a page
#[derive(Debug)]
pub struct PageInjection {
    pub client: BridgeClient,
    pub evm: EvmProvider,
    /// feeds window messages into the client
    pub messages: Listener,
    /// re-announces the provider on discovery requests
    pub discovery: Listener,
}

/// Injects the chain-injected extension and the EVM provider into the page
pub fn inject(window: &LocalWindow, config: InjectConfig) -> PageInjection {
    let config = Arc::new(config);
    let client = BridgeClient::new(
        WindowTransport::new(window),
        config.origins(),
        config.extension_prefix.clone(),
    );
    let messages = listen(window, client.clone());

    let extension = Extension::new(client.clone(), config.clone());
    let version = config.version.as_deref().unwrap_or_default();
    inject_extension(window, &config.name, version, extension);

    let evm = EvmProvider::new(client.clone(), config.clone(), window.dapp_origin());
    inject_evm_provider(window, evm.clone(), &config);

    let detail = ProviderDetail::new(config.provider_info.to_provider_info(), evm.clone());
    let discovery = announce_provider(window, detail);

    PageInjection { client, evm, messages, discovery }
}
