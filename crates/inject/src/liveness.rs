//! Keep-alive probing of the wallet relay

use inject_bridge::BridgeClient;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};

/// Method of the keep-alive probe
pub const PING: &str = "pub(ping)";

/// Whether the relay answered the recent probes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Liveness {
    #[default]
    Alive,
    /// More consecutive probes than tolerated went unanswered
    Unresponsive,
}

/// Timing of the keep-alive probe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LivenessConfig {
    /// Base delay between two probes, also the time a probe may take
    pub interval_ms: u64,
    /// Upper bound of the random delay added to every interval
    pub jitter_ms: u64,
    /// Consecutive failed probes tolerated before the relay counts as unresponsive
    pub max_misses: u32,
}

impl LivenessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// The delay before the next probe
    pub fn next_delay(&self) -> Duration {
        let jitter =
            if self.jitter_ms == 0 { 0 } else { rand::rng().random_range(0..=self.jitter_ms) };
        Duration::from_millis(self.interval_ms + jitter)
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self { interval_ms: 10_000, jitter_ms: 3_000, max_misses: 3 }
    }
}

/// Periodically pings the relay and tracks whether it answers.
///
/// Probe failures are only logged and reflected in [`Liveness`], the monitor never tears down any
/// pending call or subscription. The probing task is aborted when the monitor is dropped.
#[derive(Debug)]
pub struct LivenessMonitor {
    status: watch::Receiver<Liveness>,
    task: JoinHandle<()>,
}

impl LivenessMonitor {
    /// Spawns the probing task on the given runtime
    pub fn spawn(client: BridgeClient, config: LivenessConfig, handle: &Handle) -> Self {
        let (tx, status) = watch::channel(Liveness::Alive);
        let task = handle.spawn(probe(client, config, tx));
        Self { status, task }
    }

    /// Spawns the probing task on the current runtime, if there is one
    pub fn try_spawn(client: BridgeClient, config: LivenessConfig) -> Option<Self> {
        match Handle::try_current() {
            Ok(handle) => Some(Self::spawn(client, config, &handle)),
            Err(_) => {
                warn!(target: "inject::liveness", "no runtime available, liveness probe disabled");
                None
            }
        }
    }

    /// The last observed status
    pub fn status(&self) -> Liveness {
        *self.status.borrow()
    }

    /// Subscribes to status changes
    pub fn subscribe(&self) -> watch::Receiver<Liveness> {
        self.status.clone()
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn probe(client: BridgeClient, config: LivenessConfig, status: watch::Sender<Liveness>) {
    let mut misses = 0u32;
    loop {
        tokio::time::sleep(config.next_delay()).await;

        let pending = client.send(PING, None);
        let id = pending.id().to_string();
        let missed = match tokio::time::timeout(config.interval(), pending).await {
            Ok(Ok(_)) => false,
            Ok(Err(err)) => {
                warn!(target: "inject::liveness", %err, "ping failed");
                true
            }
            Err(_) => {
                // no cancellation on the relay side, only forget the call locally
                client.remove(&id);
                warn!(target: "inject::liveness", %id, "ping timed out");
                true
            }
        };

        if missed {
            misses += 1;
            if misses > config.max_misses {
                status.send_if_modified(|current| {
                    let changed = *current != Liveness::Unresponsive;
                    if changed {
                        error!(target: "inject::liveness", misses, "relay is unresponsive");
                    }
                    *current = Liveness::Unresponsive;
                    changed
                });
            }
        } else {
            if misses > 0 {
                debug!(target: "inject::liveness", misses, "relay answered again");
            }
            misses = 0;
            status.send_if_modified(|current| {
                let changed = *current != Liveness::Alive;
                *current = Liveness::Alive;
                changed
            });
        }
    }
}
