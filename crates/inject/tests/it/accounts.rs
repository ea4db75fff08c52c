use crate::utils::{Relay, enable, wait_until};
use inject::{
    InjectConfig, LocalWindow, inject,
    rpc::ProviderError,
    substrate::types::InjectedAccount,
};
use parking_lot::Mutex;
use serde_json::json;
use similar_asserts::assert_eq;
use std::sync::Arc;

fn config() -> InjectConfig {
    InjectConfig::default().with_liveness(None)
}

fn account(address: &str) -> InjectedAccount {
    InjectedAccount { address: address.to_string(), genesis_hash: None, name: None, key_type: None }
}

#[tokio::test]
async fn enable_authorizes_the_page() {
    let window = LocalWindow::with_title("app.example", "Example dapp");
    let _page = inject(&window, config());
    let mut relay = Relay::attach(&window);

    let injected = enable(&window, &mut relay, "subwallet-js").await;
    assert_eq!(relay.requests()[0].request, Some(json!({ "origin": "Example dapp" })));
    assert!(injected.liveness().is_none());
}

#[tokio::test]
async fn rejected_enable_is_an_error() {
    let window = LocalWindow::new("app.example");
    let _page = inject(&window, config());
    let mut relay = Relay::attach(&window);

    let extension = window.injected_extension("subwallet-js").unwrap().enable;
    let (res, _) = tokio::join!(extension.enable("app.example"), async {
        let request = relay.expect("pub(authorize.tabV2)").await;
        relay.reject(&request.id, &ProviderError::user_reject());
    });
    let err = res.unwrap_err();
    assert_eq!(err.as_provider_error(), Some(&ProviderError::user_reject()));
}

#[tokio::test]
async fn get_lists_accounts() {
    let window = LocalWindow::new("app.example");
    let _page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let (accounts, _) = tokio::join!(injected.accounts.get(false), async {
        let request = relay.expect("pub(accounts.listV2)").await;
        assert_eq!(
            request.request,
            Some(json!({ "anyType": false, "accountAuthType": "substrate" }))
        );
        relay.respond(&request.id, json!([{ "address": "5F..." }]));
    });
    assert_eq!(accounts.unwrap(), vec![account("5F...")]);
}

#[tokio::test]
async fn subscribe_receives_every_update() {
    let window = LocalWindow::new("app.example");
    let page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let subscription = injected.accounts.subscribe(move |accounts| sink.lock().push(accounts));

    let request = relay.expect("pub(accounts.subscribeV2)").await;
    relay.respond(&request.id, json!("sub-1"));
    wait_until(|| subscription.id().is_some()).await;
    assert_eq!(subscription.id().as_deref(), Some("sub-1"));

    relay.push(&request.id, json!([{ "address": "5F..." }]));
    relay.push(&request.id, json!([{ "address": "5F..." }]));
    // a second answer to the subscribing call is not a push
    relay.respond(&request.id, json!("sub-2"));

    assert_eq!(*updates.lock(), vec![vec![account("5F...")], vec![account("5F...")]]);
    assert_eq!(subscription.id().as_deref(), Some("sub-1"));
    assert!(page.client.is_pending(&request.id));
}

#[tokio::test]
async fn unsubscribe_stops_updates() {
    let window = LocalWindow::new("app.example");
    let page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let updates = Arc::new(Mutex::new(0));
    let counter = updates.clone();
    let subscription = injected.accounts.subscribe(move |_| *counter.lock() += 1);
    let request = relay.expect("pub(accounts.subscribeV2)").await;
    relay.respond(&request.id, json!("sub-1"));
    wait_until(|| subscription.id().is_some()).await;

    subscription.unsubscribe();
    let unsubscribe = relay.expect("pub(accounts.unsubscribe)").await;
    assert_eq!(unsubscribe.request, Some(json!({ "id": "sub-1" })));
    relay.respond(&unsubscribe.id, json!(true));
    wait_until(|| !page.client.is_pending(&request.id)).await;

    relay.push(&request.id, json!([]));
    assert_eq!(*updates.lock(), 0);

    // already cancelled
    subscription.unsubscribe();
    assert!(!relay.has_pending_request());
}

#[tokio::test]
async fn unsubscribe_before_confirmation_is_a_noop() {
    let window = LocalWindow::new("app.example");
    let page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let subscription = injected.accounts.subscribe(|_| {});
    let request = relay.expect("pub(accounts.subscribeV2)").await;

    subscription.unsubscribe();
    assert!(!relay.has_pending_request());
    assert!(page.client.is_pending(&request.id));
}

#[tokio::test]
async fn malformed_update_is_skipped() {
    let window = LocalWindow::new("app.example");
    let _page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let _subscription = injected.accounts.subscribe(move |accounts| sink.lock().push(accounts));
    let request = relay.expect("pub(accounts.subscribeV2)").await;

    relay.push(&request.id, json!({ "not": "a list" }));
    relay.push(&request.id, json!([]));
    assert_eq!(*updates.lock(), vec![Vec::<InjectedAccount>::new()]);
}

#[tokio::test]
async fn rejected_subscription_delivers_nothing() {
    let window = LocalWindow::new("app.example");
    let page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let updates = Arc::new(Mutex::new(0));
    let counter = updates.clone();
    let subscription = injected.accounts.subscribe(move |_| *counter.lock() += 1);
    let request = relay.expect("pub(accounts.subscribeV2)").await;
    relay.reject(&request.id, &ProviderError::unauthorized());
    wait_until(|| !page.client.is_pending(&request.id)).await;

    relay.push(&request.id, json!([{ "address": "5F..." }]));
    assert_eq!(*updates.lock(), 0);
    assert_eq!(subscription.id(), None);
}

#[tokio::test]
async fn failed_unsubscribe_still_stops_updates() {
    let window = LocalWindow::new("app.example");
    let page = inject(&window, config());
    let mut relay = Relay::attach(&window);
    let injected = enable(&window, &mut relay, "subwallet-js").await;

    let updates = Arc::new(Mutex::new(0));
    let counter = updates.clone();
    let subscription = injected.accounts.subscribe(move |_| *counter.lock() += 1);
    let request = relay.expect("pub(accounts.subscribeV2)").await;
    relay.respond(&request.id, json!("sub-1"));
    wait_until(|| subscription.id().is_some()).await;

    subscription.unsubscribe();
    let unsubscribe = relay.expect("pub(accounts.unsubscribe)").await;
    relay.reject(&unsubscribe.id, &ProviderError::disconnected());
    wait_until(|| !page.client.is_pending(&request.id)).await;

    relay.push(&request.id, json!([]));
    assert_eq!(*updates.lock(), 0);
}
