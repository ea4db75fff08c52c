//! Request and response envelopes exchanged over the page transport

use crate::error::ProviderError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Origin tag suffix of messages sent by the page
pub const PAGE_ORIGIN: &str = "koni-page";
/// Origin tag suffix of messages sent by the content script relay
pub const CONTENT_ORIGIN: &str = "koni-content";

/// The pair of origin tags used to tell page traffic from relay traffic.
///
/// Both tags share the extension prefix, so two extensions injecting into the same page never
/// accept each other's responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origins {
    /// Tag attached to every request envelope leaving the page
    pub page: String,
    /// Tag every accepted response envelope must carry
    pub content: String,
}

impl Origins {
    /// Derives both tags from the extension prefix
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            page: format!("{prefix}{PAGE_ORIGIN}"),
            content: format!("{prefix}{CONTENT_ORIGIN}"),
        }
    }
}

impl Default for Origins {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

/// A request leaving the page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation id, unique within the page session
    pub id: String,
    /// Namespaced method, e.g. `pub(accounts.listV2)`
    pub message: String,
    /// Origin tag of the sender
    pub origin: String,
    /// Request payload, `null` on the wire when absent
    pub request: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
        request: Option<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            origin: origin.into(),
            request: request.filter(|req| !req.is_null()),
        }
    }
}

/// A delivery coming back from the relay.
///
/// `response` and `subscription` keep the difference between an absent field and an explicit
/// `null`, a subscription push of `null` or `false` is still a push.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<Value>,
}

/// Maps a present field to `Some`, even when its value is `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// What a single delivery means for the pending call it belongs to
#[derive(Clone, Debug, PartialEq)]
pub enum ResponsePayload {
    /// A subscription push, the pending call stays registered
    Subscription(Value),
    /// The relay reported a failure
    Error(ProviderError),
    /// The call completed
    Response(Value),
}

// === impl ResponseEnvelope ===

impl ResponseEnvelope {
    /// A successful response
    pub fn response(id: impl Into<String>, response: Value) -> Self {
        Self { id: id.into(), response: Some(response), ..Default::default() }
    }

    /// A subscription push
    pub fn subscription(id: impl Into<String>, subscription: Value) -> Self {
        Self { id: id.into(), subscription: Some(subscription), ..Default::default() }
    }

    /// A failure, serialized the way the relay reports it
    pub fn error(id: impl Into<String>, error: &ProviderError) -> Self {
        Self {
            id: id.into(),
            error: Some(error.message.to_string()),
            error_code: error.code,
            error_type: Some(error.error_type.as_str().to_string()),
            error_data: error.data.clone(),
            ..Default::default()
        }
    }

    /// Tags the envelope with the given origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Classifies the delivery.
    ///
    /// A subscription push wins over an error, an error wins over a response.
    pub fn into_payload(self) -> ResponsePayload {
        if let Some(update) = self.subscription {
            return ResponsePayload::Subscription(update);
        }
        if let Some(error) = self.error {
            return ResponsePayload::Error(ProviderError::from_relay(
                Some(&error),
                self.error_code,
                self.error_type.as_deref(),
                self.error_data,
            ));
        }
        ResponsePayload::Response(self.response.unwrap_or(Value::Null))
    }
}
