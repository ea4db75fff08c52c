//! Aggregated error type for bridge calls

use crate::transport::TransportError;
use inject_rpc::ProviderError;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Errors surfaced by a bridged call
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The relay answered with an error envelope
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The pending call was dropped without an answer, e.g. on teardown
    #[error("bridge closed before the relay answered")]
    Closed,
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BridgeError {
    /// Returns the relay error, if this is one
    pub fn as_provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }
}
