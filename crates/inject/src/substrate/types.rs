//! Payloads of the chain-injected provider

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key type an account request is scoped to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountAuthType {
    #[default]
    Substrate,
    Evm,
    Both,
}

/// An account exposed to the page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedAccount {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// key type, e.g. `sr25519` or `ethereum`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

/// Chain metadata a page offers to the wallet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDef {
    pub chain: String,
    pub genesis_hash: String,
    pub icon: String,
    pub ss58_format: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_type: Option<String>,
    pub spec_version: u32,
    pub token_decimals: u8,
    pub token_symbol: String,
    /// registry type definitions, passed through untouched
    #[serde(default)]
    pub types: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_calls: Option<String>,
}

/// Metadata the wallet already holds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedMetadataKnown {
    pub genesis_hash: String,
    pub spec_version: u32,
}

/// A token the page asks the wallet to track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTokenRequest {
    pub contract_address: String,
    pub symbol: String,
    pub decimals: u8,
    /// token standard, e.g. `erc20` or `psp22`
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Description of a provider the wallet can start
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMeta {
    pub network: String,
    /// `full` or `light`
    pub node: String,
    pub source: String,
    pub transport: String,
}

/// An extrinsic to sign, in its JSON representation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerPayloadJson {
    pub address: String,
    pub block_hash: String,
    pub block_number: String,
    pub era: String,
    pub genesis_hash: String,
    pub method: String,
    pub nonce: String,
    pub spec_version: String,
    pub tip: String,
    pub transaction_version: String,
    pub signed_extensions: Vec<String>,
    pub version: u32,
}

/// Raw bytes to sign
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerPayloadRaw {
    pub address: String,
    pub data: String,
    /// `bytes` or `payload`
    #[serde(rename = "type")]
    pub payload_type: String,
}

/// A signature, tagged with the signer's local request id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerResult {
    pub id: u64,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_transaction: Option<String>,
    /// any other field the wallet reported
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Events of the chain-injected RPC provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderEvent {
    Connected,
    Disconnected,
    Error,
}

impl ProviderEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}
