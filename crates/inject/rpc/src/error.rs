//! Typed provider errors
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{borrow::Cow, fmt};

/// An error reported by the wallet relay, or raised by a provider facade
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderError {
    pub error_type: ErrorType,
    /// human readable message
    pub message: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    /// New [`ProviderError`] with the canned message and code of the given [`ErrorType`].
    pub const fn new(error_type: ErrorType) -> Self {
        Self {
            message: Cow::Borrowed(error_type.message()),
            code: error_type.code(),
            error_type,
            data: None,
        }
    }

    /// Creates a new `UserReject` error.
    pub const fn user_reject() -> Self {
        Self::new(ErrorType::UserReject)
    }

    /// Creates a new `Unauthorized` error.
    pub const fn unauthorized() -> Self {
        Self::new(ErrorType::Unauthorized)
    }

    /// Creates a new `UnsupportedMethod` error.
    pub const fn unsupported_method() -> Self {
        Self::new(ErrorType::UnsupportedMethod)
    }

    /// Creates a new `Disconnected` error.
    pub const fn disconnected() -> Self {
        Self::new(ErrorType::Disconnected)
    }

    /// Creates a new `InternalError` error.
    pub const fn internal_error() -> Self {
        Self::new(ErrorType::InternalError)
    }

    /// Creates a new `InvalidParams` error with a message.
    pub fn invalid_params<M>(message: M) -> Self
    where
        M: Into<String>,
    {
        Self::new(ErrorType::InvalidParams).with_message(message)
    }

    /// Replaces the message
    pub fn with_message<M>(mut self, message: M) -> Self
    where
        M: Into<String>,
    {
        self.message = Cow::Owned(message.into());
        self
    }

    /// Attaches additional error data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Builds the error from the fields of a relay error envelope.
    ///
    /// The symbolic type is taken from the explicit `errorType` field, then from an `error`
    /// string that is itself a symbol, then from the numeric code. The message falls back to
    /// the canned message of the resolved type when the relay supplied none.
    pub fn from_relay(
        error: Option<&str>,
        code: Option<i64>,
        error_type: Option<&str>,
        data: Option<Value>,
    ) -> Self {
        let error_type = error_type
            .and_then(ErrorType::from_symbol)
            .or_else(|| error.and_then(ErrorType::from_symbol))
            .or_else(|| code.map(ErrorType::from_code))
            .unwrap_or(ErrorType::Unknown);

        let message = match error {
            Some(msg) if !msg.is_empty() && ErrorType::from_symbol(msg).is_none() => {
                Cow::Owned(msg.to_string())
            }
            _ => Cow::Borrowed(error_type.message()),
        };

        Self { error_type, message, code: code.or(error_type.code()), data }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} ({code}): {}", self.error_type.as_str(), self.message),
            None => write!(f, "{}: {}", self.error_type.as_str(), self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Symbolic error types, shared by the chain-injected and the EVM facade.
///
/// The numeric codes follow EIP-1193 and JSON-RPC, see also
/// <https://github.com/MetaMask/eth-rpc-errors/blob/main/src/error-constants.ts>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// The user rejected the request.
    UserReject,
    /// The requested method and/or account has not been authorized by the user.
    Unauthorized,
    /// The provider does not support the requested method.
    UnsupportedMethod,
    /// The provider is disconnected from all chains.
    Disconnected,
    /// The provider is not connected to the requested chain.
    ChainDisconnected,
    /// invalid method parameter.
    InvalidParams,
    /// internal call error
    InternalError,
    /// anything the relay reported without a recognizable type
    #[serde(other)]
    Unknown,
}

impl ErrorType {
    /// Returns the symbol used on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UserReject => "USER_REJECT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnsupportedMethod => "UNSUPPORTED_METHOD",
            Self::Disconnected => "DISCONNECTED",
            Self::ChainDisconnected => "CHAIN_DISCONNECTED",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parses a wire symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let ty = match symbol {
            "USER_REJECT" => Self::UserReject,
            "UNAUTHORIZED" => Self::Unauthorized,
            "UNSUPPORTED_METHOD" => Self::UnsupportedMethod,
            "DISCONNECTED" => Self::Disconnected,
            "CHAIN_DISCONNECTED" => Self::ChainDisconnected,
            "INVALID_PARAMS" => Self::InvalidParams,
            "INTERNAL_ERROR" => Self::InternalError,
            "UNKNOWN" => Self::Unknown,
            _ => return None,
        };
        Some(ty)
    }

    /// Maps a numeric code to its symbolic type
    pub const fn from_code(code: i64) -> Self {
        match code {
            4001 => Self::UserReject,
            4100 => Self::Unauthorized,
            4200 | -32601 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            _ => Self::Unknown,
        }
    }

    /// Returns the numeric code associated with the type
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::UserReject => Some(4001),
            Self::Unauthorized => Some(4100),
            Self::UnsupportedMethod => Some(4200),
            Self::Disconnected => Some(4900),
            Self::ChainDisconnected => Some(4901),
            Self::InvalidParams => Some(-32602),
            Self::InternalError => Some(-32603),
            Self::Unknown => None,
        }
    }

    /// Returns the canned message associated with the type
    pub const fn message(&self) -> &'static str {
        match self {
            Self::UserReject => "User rejected the request.",
            Self::Unauthorized => {
                "The requested account and/or method has not been authorized by the user."
            }
            Self::UnsupportedMethod => "The requested method is not supported by this provider.",
            Self::Disconnected => "The provider is disconnected from all chains.",
            Self::ChainDisconnected => "The provider is disconnected from the specified chain.",
            Self::InvalidParams => "Invalid method parameter(s).",
            Self::InternalError => "Internal JSON-RPC error.",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
