//! The chain-injected provider, registered in `injectedWeb3`

mod accounts;
mod metadata;
mod provider;
mod signer;
pub mod types;

pub use accounts::{Accounts, AccountsSubscription};
pub use metadata::Metadata;
pub use provider::{RpcProvider, SubscriptionCallback, SubscriptionHandler};
pub use signer::Signer;

use crate::{
    config::InjectConfig,
    liveness::{Liveness, LivenessMonitor},
};
use inject_bridge::{BridgeClient, Result};
use serde_json::json;
use std::sync::Arc;

/// The enable entry point of the extension, what `injectedWeb3[name].enable` calls
#[derive(Clone, Debug)]
pub struct Extension {
    client: BridgeClient,
    config: Arc<InjectConfig>,
}

impl Extension {
    pub fn new(client: BridgeClient, config: Arc<InjectConfig>) -> Self {
        Self { client, config }
    }

    /// Asks the user to authorize `origin`, resolves with the injected APIs once granted
    pub async fn enable(&self, origin: &str) -> Result<Injected> {
        self.client.send("pub(authorize.tabV2)", Some(json!({ "origin": origin }))).await?;
        Ok(Injected::new(self.client.clone(), &self.config))
    }
}

/// The APIs handed to an authorized page
#[derive(Debug)]
pub struct Injected {
    pub accounts: Accounts,
    pub metadata: Metadata,
    pub provider: RpcProvider,
    pub signer: Signer,
    liveness: Option<LivenessMonitor>,
}

impl Injected {
    /// Builds the APIs over the client and starts probing the relay when configured
    pub fn new(client: BridgeClient, config: &InjectConfig) -> Self {
        let liveness = config
            .liveness
            .clone()
            .and_then(|liveness| LivenessMonitor::try_spawn(client.clone(), liveness));
        Self {
            accounts: Accounts::new(client.clone()),
            metadata: Metadata::new(client.clone()),
            provider: RpcProvider::new(client.clone()),
            signer: Signer::new(client),
            liveness,
        }
    }

    /// The liveness probe, if one is running
    pub fn liveness(&self) -> Option<&LivenessMonitor> {
        self.liveness.as_ref()
    }

    /// Status of the relay, [`Liveness::Alive`] without a probe
    pub fn liveness_status(&self) -> Liveness {
        self.liveness.as_ref().map(LivenessMonitor::status).unwrap_or_default()
    }
}
