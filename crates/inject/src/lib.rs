//! # inject
//!
//! Wallet providers injected into a page.
//!
//! Two independent facades are built on a single [`BridgeClient`]:
//!  - the chain-injected extension registered in `injectedWeb3`, see [`substrate`]
//!  - the EIP-1193 provider exposed as a global and announced over EIP-6963, see [`evm`]
//!
//! Everything travels as envelopes over the page [`window`], the wallet answers through its
//! content script relay.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod emitter;
pub mod error;
pub mod evm;
pub mod liveness;
mod page;
pub mod substrate;
pub mod window;

pub use config::InjectConfig;
pub use emitter::{EventEmitter, Listener};
pub use error::EvmProviderError;
pub use evm::EvmProvider;
pub use liveness::{Liveness, LivenessConfig, LivenessMonitor};
pub use page::{PageInjection, inject, inject_evm_provider, inject_extension};
pub use substrate::{Extension, Injected};
pub use window::LocalWindow;

pub use inject_bridge::{self as bridge, BridgeClient, BridgeError};
pub use inject_rpc::{self as rpc, ErrorType, ProviderError};

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;

/// Runs a fire-and-forget future on the current runtime
pub(crate) fn spawn_detached<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(fut);
        }
        Err(_) => warn!(target: "inject", "no runtime available, dropping background task"),
    }
}

/// Serializes a request payload
pub(crate) fn to_request<T: Serialize>(value: &T) -> inject_bridge::Result<Value> {
    Ok(serde_json::to_value(value)?)
}
