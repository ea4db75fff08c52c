//! Wire types shared by the page-side bridge and the wallet relay.
//!
//! Every message that crosses the page/relay boundary is an envelope: a request envelope
//! carries a namespaced method (`pub(..)`, `pri(..)`, `evm(..)`), a response envelope carries
//! exactly one of a response, a subscription push or an error.

pub mod envelope;
pub mod error;
pub mod message;
pub mod subscription;

pub use envelope::{Origins, RequestEnvelope, ResponseEnvelope, ResponsePayload};
pub use error::{ErrorType, ProviderError};
pub use message::MessageType;
pub use subscription::{SubscriptionId, SubscriptionKey};
