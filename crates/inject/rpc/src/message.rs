//! Method namespaces

use std::fmt;

/// Namespace of a bridged method.
///
/// `pub(..)` methods are chain agnostic and callable by any page, `evm(..)` methods are
/// EVM specific, `pri(..)` methods are reserved for the wallet's own UI and are never sent by
/// an injected provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Pub,
    Pri,
    Evm,
    Unknown,
}

impl MessageType {
    /// Classifies a namespaced method string
    pub fn of(message: &str) -> Self {
        if message.starts_with("pub(") {
            Self::Pub
        } else if message.starts_with("pri(") {
            Self::Pri
        } else if message.starts_with("evm(") {
            Self::Evm
        } else {
            Self::Unknown
        }
    }

    /// Whether a page script may send methods of this namespace
    pub const fn is_page_callable(&self) -> bool {
        matches!(self, Self::Pub | Self::Evm)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pub => "PUB",
            Self::Pri => "PRI",
            Self::Evm => "EVM",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}
