use crate::utils::{Relay, enable};
use inject::{
    InjectConfig, Liveness, LivenessConfig, LivenessMonitor, LocalWindow, PageInjection, inject,
    liveness::PING,
};
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Handle;

fn setup() -> (LocalWindow, PageInjection, Relay) {
    let window = LocalWindow::new("app.example");
    let page = inject(&window, InjectConfig::default().with_liveness(None));
    let relay = Relay::attach(&window);
    (window, page, relay)
}

fn fixed(max_misses: u32) -> LivenessConfig {
    LivenessConfig { interval_ms: 1_000, jitter_ms: 0, max_misses }
}

/// Answers the next ping that is still awaited, skipping timed out ones
async fn answer_ping(relay: &mut Relay, page: &PageInjection) {
    loop {
        let ping = relay.expect(PING).await;
        if page.client.is_pending(&ping.id) {
            relay.respond(&ping.id, json!(true));
            return;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn answered_pings_keep_relay_alive() {
    let (_window, page, mut relay) = setup();
    let monitor = LivenessMonitor::spawn(page.client.clone(), fixed(1), &Handle::current());
    let status = monitor.subscribe();

    for _ in 0..3 {
        let ping = relay.expect(PING).await;
        assert_eq!(ping.request, None);
        relay.respond(&ping.id, json!(true));
    }

    assert_eq!(monitor.status(), Liveness::Alive);
    assert!(!status.has_changed().unwrap());
    assert_eq!(relay.count(PING), 3);
}

#[tokio::test(start_paused = true)]
async fn missed_pings_flip_to_unresponsive() {
    let (_window, page, mut relay) = setup();

    // a call the relay never answers, the monitor must leave it alone
    let waiting = page.client.send("pub(authorize.tabV2)", Some(json!({ "origin": "x" })));
    relay.expect("pub(authorize.tabV2)").await;

    let monitor = LivenessMonitor::spawn(page.client.clone(), fixed(2), &Handle::current());
    let mut status = monitor.subscribe();

    tokio::time::timeout(Duration::from_secs(60), status.changed()).await.unwrap().unwrap();
    assert_eq!(*status.borrow_and_update(), Liveness::Unresponsive);
    assert_eq!(monitor.status(), Liveness::Unresponsive);
    // one more than tolerated
    assert_eq!(relay.count(PING), 3);

    assert!(page.client.is_pending(waiting.id()));
    assert_eq!(page.client.pending(), 1);
}

#[tokio::test(start_paused = true)]
async fn tolerated_misses_do_not_flip() {
    let (_window, page, mut relay) = setup();
    let monitor = LivenessMonitor::spawn(page.client.clone(), fixed(2), &Handle::current());
    let status = monitor.subscribe();

    // two misses, then an answer resets the count
    relay.expect(PING).await;
    relay.expect(PING).await;
    answer_ping(&mut relay, &page).await;
    relay.expect(PING).await;
    relay.expect(PING).await;
    answer_ping(&mut relay, &page).await;

    assert!(!status.has_changed().unwrap());
    assert_eq!(monitor.status(), Liveness::Alive);
}

#[tokio::test(start_paused = true)]
async fn answered_ping_recovers() {
    let (_window, page, mut relay) = setup();
    let monitor = LivenessMonitor::spawn(page.client.clone(), fixed(0), &Handle::current());
    let mut status = monitor.subscribe();

    tokio::time::timeout(Duration::from_secs(60), status.changed()).await.unwrap().unwrap();
    assert_eq!(*status.borrow_and_update(), Liveness::Unresponsive);

    answer_ping(&mut relay, &page).await;
    tokio::time::timeout(Duration::from_secs(60), status.changed()).await.unwrap().unwrap();
    assert_eq!(*status.borrow_and_update(), Liveness::Alive);
}

#[tokio::test(start_paused = true)]
async fn dropped_monitor_stops_probing() {
    let (_window, page, mut relay) = setup();
    let monitor = LivenessMonitor::spawn(page.client.clone(), fixed(1), &Handle::current());
    answer_ping(&mut relay, &page).await;

    drop(monitor);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(relay.count(PING), 1);
}

#[tokio::test(start_paused = true)]
async fn enabled_extension_runs_configured_probe() {
    let window = LocalWindow::new("app.example");
    let config = InjectConfig::default().with_liveness(Some(fixed(3)));
    let page = inject(&window, config);
    let mut relay = Relay::attach(&window);

    let injected = enable(&window, &mut relay, "subwallet-js").await;
    assert!(injected.liveness().is_some());
    assert_eq!(injected.liveness_status(), Liveness::Alive);

    answer_ping(&mut relay, &page).await;
    assert_eq!(injected.liveness_status(), Liveness::Alive);
}
