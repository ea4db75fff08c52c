use super::types::{SignerPayloadJson, SignerPayloadRaw, SignerResult};
use crate::to_request;
use inject_bridge::{BridgeClient, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Signing through the wallet.
///
/// Every signature is tagged with a locally incremented id, the id the relay reports is a hash
/// and not reused.
#[derive(Clone, Debug)]
pub struct Signer {
    client: BridgeClient,
    next_id: Arc<AtomicU64>,
}

/// What the relay answers to a signing request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelaySignature {
    signature: String,
    #[serde(default)]
    signed_transaction: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Signer {
    pub fn new(client: BridgeClient) -> Self {
        Self { client, next_id: Arc::default() }
    }

    /// Signs an extrinsic
    pub async fn sign_payload(&self, payload: &SignerPayloadJson) -> Result<SignerResult> {
        self.sign("pub(extrinsic.sign)", to_request(payload)?).await
    }

    /// Signs raw bytes
    pub async fn sign_raw(&self, payload: &SignerPayloadRaw) -> Result<SignerResult> {
        self.sign("pub(bytes.sign)", to_request(payload)?).await
    }

    async fn sign(&self, message: &str, request: Value) -> Result<SignerResult> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let RelaySignature { signature, signed_transaction, mut extra } =
            self.client.send(message, Some(request)).decode().await?;
        // the relay's own id is replaced by the local one
        extra.remove("id");
        Ok(SignerResult { id, signature, signed_transaction, extra })
    }
}
