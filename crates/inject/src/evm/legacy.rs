//! The pre EIP-1193 `send`/`sendAsync` surface some pages still use

use super::provider::{EvmProvider, RequestArguments};
use crate::{error::EvmProviderError, spawn_detached};
use inject_bridge::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC request object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcPayload {
    #[serde(default)]
    pub id: Value,
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn default_version() -> String {
    "2.0".to_string()
}

impl JsonRpcPayload {
    pub fn new(id: impl Into<Value>, method: impl Into<String>) -> Self {
        Self { id: id.into(), jsonrpc: default_version(), method: method.into(), params: None }
    }

    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    fn arguments(&self) -> RequestArguments {
        RequestArguments { method: self.method.clone(), params: self.params.clone() }
    }

    fn respond(&self, result: Value) -> JsonRpcResponse {
        JsonRpcResponse { id: self.id.clone(), jsonrpc: self.jsonrpc.clone(), result }
    }
}

/// A JSON-RPC success response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Value,
    pub jsonrpc: String,
    pub result: Value,
}

impl EvmProvider {
    /// `send(method, params)`, the same as [`Self::request`]
    pub async fn send(&self, method: &str, params: Option<Vec<Value>>) -> Result<Value> {
        let mut args = RequestArguments::new(method);
        args.params = params.map(Value::Array);
        self.request(args).await
    }

    /// `send(payload, callback)`, invokes `callback` with the result on success
    pub async fn send_with_callback<F>(&self, payload: &JsonRpcPayload, callback: F) -> Result<()>
    where
        F: FnOnce(Value),
    {
        let result = self.request(payload.arguments()).await?;
        callback(result);
        Ok(())
    }

    /// `send(payload)` without callback, answered locally.
    ///
    /// Only `net_version` is supported, it never touches the wallet.
    pub fn send_sync(&self, payload: &JsonRpcPayload) -> Result<JsonRpcResponse, EvmProviderError> {
        let result = match payload.method.as_str() {
            "net_version" => self.config().net_version().map(Value::String).unwrap_or(Value::Null),
            method => return Err(EvmProviderError::UnsupportedSyncMethod(method.to_string())),
        };
        Ok(payload.respond(result))
    }

    /// `sendAsync(payload, callback)`, `callback` receives the response or the failure
    pub fn send_async<F>(&self, payload: JsonRpcPayload, callback: F)
    where
        F: FnOnce(Result<JsonRpcResponse, BridgeError>) + Send + 'static,
    {
        let provider = self.clone();
        spawn_detached(async move {
            let res = provider.request(payload.arguments()).await;
            callback(res.map(|result| payload.respond(result)));
        });
    }
}
