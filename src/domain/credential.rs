use super::widget::CardBrand;
use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A publishable API key.
///
/// Only `pk_test_` and `pk_live_` keys are accepted. Secret and restricted keys
/// must never be handed to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// Validates a publishable key.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidPublicKey`] with a redacted copy of the key if it
    /// is not `pk_test_`/`pk_live_` followed by an alphanumeric body.
    pub fn new(key: impl Into<String>) -> Result<Self, CheckoutError> {
        let key = key.into();
        let body = key
            .strip_prefix("pk_test_")
            .or_else(|| key.strip_prefix("pk_live_"));
        match body {
            Some(body) if !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Ok(Self(key))
            }
            _ => Err(CheckoutError::InvalidPublicKey(redact(&key))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `pk_live_` keys.
    pub fn is_live(&self) -> bool {
        self.0.starts_with("pk_live_")
    }
}

/// Keeps the prefix of a rejected key so it can be logged without leaking it.
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    if key.chars().count() > 8 {
        format!("{}…", prefix)
    } else {
        prefix
    }
}

impl TryFrom<String> for PublicKey {
    type Error = CheckoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single-use payment token (`tok_…`).
///
/// This is what the host's token handler receives and forwards to its backend.
/// It carries no card data and is safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    /// Returns the raw id, e.g. `tok_sim_000001`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub brand: CardBrand,
    pub last4: String,
    pub exp_month: u8,
    pub exp_year: u16,
}

/// A tokenized payment credential as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub card: CardSummary,
    pub livemode: bool,
    /// Unix timestamp, seconds.
    pub created: i64,
}
