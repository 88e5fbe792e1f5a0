use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Card,
}

/// Exclusive ownership of an element created by a provider.
///
/// Deliberately not `Clone`: whoever holds the handle is the only party that
/// may mount, tokenize against, or unmount the element. Once unmounted, the
/// provider treats the id as stale.
#[derive(Debug, PartialEq, Eq)]
pub struct WidgetHandle {
    id: WidgetId,
    kind: ElementKind,
}

impl WidgetHandle {
    /// Wraps an element the provider has just created. Only providers call this.
    pub fn new(id: WidgetId, kind: ElementKind) -> Self {
        Self { id, kind }
    }

    /// Returns the provider's id for the element.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }
}

/// Error classes reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ValidationError,
    CardError,
    InvalidRequestError,
    ApiConnectionError,
    ApiError,
    AuthenticationError,
    RateLimitError,
}

/// A fault reported by the provider, either on a change event or as the
/// result of a tokenization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFault {
    #[serde(rename = "type")]
    pub kind: FaultKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl ProviderFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn validation(code: &str, message: impl Into<String>) -> Self {
        Self::new(FaultKind::ValidationError, message).with_code(code)
    }
}

impl fmt::Display for ProviderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

/// Payload of a widget `change` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub widget: WidgetId,
    pub empty: bool,
    pub complete: bool,
    pub brand: CardBrand,
    pub error: Option<ProviderFault>,
}
