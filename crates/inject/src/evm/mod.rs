//! The EIP-1193 provider exposed to EVM pages

mod discovery;
pub mod events;
mod legacy;
mod provider;

pub use discovery::{
    ANNOUNCE_PROVIDER_EVENT, Eip1193, ProviderDetail, ProviderInfo, REQUEST_PROVIDER_EVENT,
    announce_provider, request_providers,
};
pub use events::EvmEvent;
pub use legacy::{JsonRpcPayload, JsonRpcResponse};
pub use provider::{EvmProvider, RequestArguments};
