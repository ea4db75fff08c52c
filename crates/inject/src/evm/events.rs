//! Events the wallet pushes to the EVM provider

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Events re-emitted by the EVM provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvmEvent {
    Connect,
    Disconnect,
    AccountsChanged,
    ChainChanged,
    /// pushed as either `message` or the legacy `data`
    Message,
    Reconnect,
    Error,
}

impl EvmEvent {
    /// Maps the wallet's event type, `None` for types the provider does not relay
    pub fn from_relay(ty: &str) -> Option<Self> {
        let event = match ty {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "accountsChanged" => Self::AccountsChanged,
            "chainChanged" => Self::ChainChanged,
            "message" | "data" => Self::Message,
            "reconnect" => Self::Reconnect,
            "error" => Self::Error,
            _ => return None,
        };
        Some(event)
    }

    /// The name the event is emitted under
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
            Self::Message => "message",
            Self::Reconnect => "reconnect",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EvmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A push of the `evm(events.subscribe)` subscription
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RelayEvent {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub payload: Value,
}
