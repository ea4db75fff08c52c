use super::types::{AccountAuthType, InjectedAccount};
use crate::spawn_detached;
use inject_bridge::{BridgeClient, Result};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Account access of an enabled extension
#[derive(Clone, Debug)]
pub struct Accounts {
    client: BridgeClient,
}

impl Accounts {
    pub fn new(client: BridgeClient) -> Self {
        Self { client }
    }

    /// Lists the accounts the page is authorized for
    pub async fn get(&self, any_type: bool) -> Result<Vec<InjectedAccount>> {
        self.client
            .send(
                "pub(accounts.listV2)",
                Some(json!({ "anyType": any_type, "accountAuthType": AccountAuthType::Substrate })),
            )
            .decode()
            .await
    }

    /// Invokes `callback` with the full account list every time it changes.
    ///
    /// Failures of the subscribing call are logged, and no updates are delivered afterwards.
    pub fn subscribe<F>(&self, callback: F) -> AccountsSubscription
    where
        F: Fn(Vec<InjectedAccount>) + Send + Sync + 'static,
    {
        let pending = self.client.subscribe(
            "pub(accounts.subscribeV2)",
            Some(json!({ "accountAuthType": AccountAuthType::Substrate })),
            move |update| match serde_json::from_value(update) {
                Ok(accounts) => callback(accounts),
                Err(err) => warn!(target: "inject::rpc", %err, "invalid accounts update"),
            },
        );

        let subscription = AccountsSubscription {
            client: self.client.clone(),
            request_id: pending.id().to_string(),
            subscription_id: Arc::default(),
        };

        let slot = subscription.subscription_id.clone();
        let client = self.client.clone();
        let request_id = subscription.request_id.clone();
        spawn_detached(async move {
            match pending.decode::<String>().await {
                Ok(id) => *slot.lock() = Some(id),
                Err(err) => {
                    warn!(target: "inject::rpc", %err, "accounts subscription failed");
                    client.remove(&request_id);
                }
            }
        });

        subscription
    }
}

/// An active accounts subscription, see [`Accounts::subscribe`]
#[derive(Debug)]
pub struct AccountsSubscription {
    client: BridgeClient,
    /// correlation id of the subscribing call
    request_id: String,
    /// the relay's subscription id, known once the call resolved
    subscription_id: Arc<Mutex<Option<String>>>,
}

impl AccountsSubscription {
    /// The relay's subscription id, `None` until the subscribing call resolved
    pub fn id(&self) -> Option<String> {
        self.subscription_id.lock().clone()
    }

    /// Cancels the subscription, best effort.
    ///
    /// Does nothing while the subscribing call has not resolved, or after the first call. Once the
    /// relay answered, confirming or not, no further updates are delivered.
    pub fn unsubscribe(&self) {
        let Some(id) = self.subscription_id.lock().take() else {
            debug!(target: "inject::rpc", "accounts subscription not established yet");
            return;
        };

        let pending = self.client.send("pub(accounts.unsubscribe)", Some(json!({ "id": id })));
        let client = self.client.clone();
        let request_id = self.request_id.clone();
        spawn_detached(async move {
            if let Err(err) = pending.await {
                warn!(target: "inject::rpc", %err, %id, "accounts unsubscribe failed");
            }
            client.remove(&request_id);
        });
    }
}
