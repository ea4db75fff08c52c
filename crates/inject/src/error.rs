//! Errors raised by the providers themselves

pub use inject_bridge::BridgeError;

/// Failure of a synchronous legacy call, the only path that fails without asking the wallet
#[derive(Debug, thiserror::Error)]
pub enum EvmProviderError {
    #[error("Not support {0}")]
    UnsupportedSyncMethod(String),
}
