use super::types::{AddTokenRequest, InjectedMetadataKnown, MetadataDef};
use crate::to_request;
use inject_bridge::{BridgeClient, Result};

/// Metadata exchange of an enabled extension
#[derive(Clone, Debug)]
pub struct Metadata {
    client: BridgeClient,
}

impl Metadata {
    pub fn new(client: BridgeClient) -> Self {
        Self { client }
    }

    /// The metadata versions the wallet knows
    pub async fn get(&self) -> Result<Vec<InjectedMetadataKnown>> {
        self.client.send("pub(metadata.list)", None).decode().await
    }

    /// Offers metadata to the wallet, resolves with whether it was accepted
    pub async fn provide(&self, definition: &MetadataDef) -> Result<bool> {
        self.client.send("pub(metadata.provide)", Some(to_request(definition)?)).decode().await
    }

    /// Asks the wallet to track a token, resolves with whether it was added
    pub async fn add_token(&self, request: &AddTokenRequest) -> Result<bool> {
        self.client.send("pub(token.add)", Some(to_request(request)?)).decode().await
    }
}
