//! Publishing the providers into the page

use crate::utils::Relay;
use inject::{
    BridgeClient, Extension, InjectConfig, LocalWindow, inject,
    bridge::ChannelTransport,
    config::ProviderInfoConfig,
    evm::{ANNOUNCE_PROVIDER_EVENT, ProviderDetail, RequestArguments, request_providers},
    rpc::Origins,
    window::{Global, InjectedExtension, ProviderSlot, WindowEvent},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use similar_asserts::assert_eq;
use std::sync::Arc;

fn config() -> InjectConfig {
    InjectConfig::default().with_liveness(None)
}

/// Counts the dispatches of `event`
fn count_events(window: &LocalWindow, event: &str) -> Arc<Mutex<usize>> {
    let count = Arc::new(Mutex::new(0));
    let counter = count.clone();
    window.add_event_listener(event, move |_| *counter.lock() += 1);
    count
}

/// Collects every EIP-6963 announcement
fn collect_announcements(window: &LocalWindow) -> Arc<Mutex<Vec<Arc<ProviderDetail>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    window.add_event_listener(ANNOUNCE_PROVIDER_EVENT, move |event| {
        if let WindowEvent::AnnounceProvider(detail) = event {
            sink.lock().push(detail.clone());
        }
    });
    seen
}

#[tokio::test]
async fn other_extensions_are_kept() {
    let window = LocalWindow::new("app.example");
    let (transport, _rx) = ChannelTransport::new();
    let other = BridgeClient::new(transport, Origins::with_prefix("pjs-"), "pjs");
    window.register_extension(
        "polkadot-js",
        InjectedExtension {
            version: "0.46.1".to_string(),
            enable: Extension::new(other, Arc::new(config())),
        },
    );

    let _page = inject(&window, config().with_version(Some("1.1.0".to_string())));

    let registry = window.injected_web3();
    assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["polkadot-js", "subwallet-js"]);
    assert_eq!(registry["polkadot-js"].version, "0.46.1");
    assert_eq!(registry["subwallet-js"].version, "1.1.0");
}

#[tokio::test]
async fn custom_names_are_used() {
    let window = LocalWindow::new("app.example");
    let initialized = count_events(&window, "Wallet#initialized");

    let config = config().with_name("custom-js").with_evm_global("Wallet").with_version(None);
    let _page = inject(&window, config);

    assert!(window.injected_extension("custom-js").is_some());
    assert_eq!(window.injected_extension("custom-js").unwrap().version, "");
    assert!(window.evm_provider("Wallet").is_some());
    assert!(!window.has_global("SubWallet"));
    assert_eq!(*initialized.lock(), 1);
}

#[tokio::test]
async fn installed_slot_receives_the_provider() {
    let window = LocalWindow::new("app.example");
    let slot = ProviderSlot::new();
    window.set_global("SubWallet", Global::Slot(slot.clone()));

    let page = inject(&window, config());

    assert!(matches!(window.global("SubWallet"), Some(Global::Slot(_))));
    let provider = slot.provider().expect("slot filled");
    assert!(provider.is_connected());
    assert!(window.evm_provider("SubWallet").is_some());
    assert!(!page.evm.is_subscribed());
}

#[tokio::test]
async fn ethereum_is_published_on_load() {
    let window = LocalWindow::new("app.example");
    let initialized = count_events(&window, "SubWallet#initialized");
    let ethereum = count_events(&window, "ethereum#initialized");

    let _page = inject(&window, config());
    assert_eq!(*initialized.lock(), 1);
    assert!(window.has_global("SubWallet"));
    assert!(!window.has_global("ethereum"));
    assert_eq!(*ethereum.lock(), 0);

    window.load();
    window.load();
    assert!(window.evm_provider("ethereum").is_some());
    assert_eq!(*ethereum.lock(), 1);
}

#[tokio::test]
async fn loaded_page_gets_ethereum_immediately() {
    let window = LocalWindow::new("app.example");
    window.load();
    let ethereum = count_events(&window, "ethereum#initialized");

    let _page = inject(&window, config());
    assert!(window.evm_provider("ethereum").is_some());
    assert_eq!(*ethereum.lock(), 1);
}

#[tokio::test]
async fn existing_ethereum_is_not_replaced() {
    let window = LocalWindow::new("app.example");
    window.set_global("ethereum", Global::Value(json!({ "isMetaMask": true })));
    let ethereum = count_events(&window, "ethereum#initialized");

    let _page = inject(&window, config());
    window.load();

    assert!(matches!(window.global("ethereum"), Some(Global::Value(_))));
    assert!(window.evm_provider("ethereum").is_none());
    assert_eq!(*ethereum.lock(), 0);
}

#[tokio::test]
async fn provider_is_announced_and_reannounced() {
    let window = LocalWindow::new("app.example");
    let announcements = collect_announcements(&window);

    let info = ProviderInfoConfig {
        name: "Example Wallet".to_string(),
        icon: "data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=".to_string(),
        rdns: "io.example.wallet".to_string(),
    };
    let page = inject(&window, config().with_provider_info(info));
    assert_eq!(announcements.lock().len(), 1);

    request_providers(&window);
    let seen = announcements.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].info, seen[1].info);
    assert_eq!(seen[0].info.name, "Example Wallet");
    assert_eq!(seen[0].info.rdns, "io.example.wallet");
    assert_eq!(seen[0].info.uuid.get_version_num(), 4);

    assert!(page.discovery.remove());
    request_providers(&window);
    assert_eq!(announcements.lock().len(), 2);
}

#[tokio::test]
async fn uuid_is_unique_per_injection() {
    let first = LocalWindow::new("a.example");
    let second = LocalWindow::new("b.example");
    let (a, b) = (collect_announcements(&first), collect_announcements(&second));

    let _first = inject(&first, config());
    let _second = inject(&second, config());

    let (a, b) = (a.lock()[0].info.clone(), b.lock()[0].info.clone());
    assert_ne!(a.uuid, b.uuid);
    assert_eq!(a.rdns, "app.subwallet");
}

#[tokio::test]
async fn announced_provider_forwards_requests() {
    let window = LocalWindow::new("app.example");
    let announcements = collect_announcements(&window);
    let _page = inject(&window, config());
    let mut relay = Relay::attach(&window);

    let detail = announcements.lock()[0].clone();
    assert!(detail.provider.is_connected());

    let (chain_id, _) = tokio::join!(
        detail.provider.request(RequestArguments::new("eth_chainId")),
        async {
            let request = relay.expect("evm(request)").await;
            relay.respond(&request.id, json!("0x1"));
        }
    );
    assert_eq!(chain_id.unwrap(), json!("0x1"));

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    let listener = detail
        .provider
        .on("chainChanged", Arc::new(move |chain: &Value| sink.lock().push(chain.clone())));
    let subscription = relay.expect("evm(events.subscribe)").await;
    relay.push(&subscription.id, json!({ "type": "chainChanged", "payload": "0x504" }));
    assert!(detail.provider.remove_listener(&listener));

    assert_eq!(*changes.lock(), vec![json!("0x504")]);
}
