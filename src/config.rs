//! Checkout configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file (or none at all) is valid. The publishable key is usually supplied on
//! the command line or through `STRIPE_PUBLIC_KEY` instead.

use crate::domain::pricing::Quote;
use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub public_key: Option<String>,
    pub currency: String,
    /// Price of one credit in minor units.
    pub cost_per_credit: Decimal,
    pub layout: PageLayout,
    pub style: StyleOptions,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            currency: "usd".to_string(),
            cost_per_credit: dec!(0.9),
            layout: PageLayout::default(),
            style: StyleOptions::default(),
        }
    }
}

impl CheckoutConfig {
    /// Reads the config file if one is given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed JSON, and on a negative `cost_per_credit`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(path) => {
                let file = File::open(path)?;
                serde_json::from_reader(BufReader::new(file))?
            }
            None => Self::default(),
        };
        if config.cost_per_credit.is_sign_negative() {
            return Err(CheckoutError::InvalidConfig(format!(
                "cost_per_credit must not be negative, got {}",
                config.cost_per_credit
            )));
        }
        Ok(config)
    }

    /// Prices `credits` at the configured rate and currency.
    pub fn quote(&self, credits: u32) -> Result<Quote> {
        Quote::new(credits, self.cost_per_credit, &self.currency)
    }
}

/// Element ids and selectors the host page must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub form_id: String,
    pub mount_selector: String,
    pub button_id: String,
    pub icon_id: String,
    pub errors_id: String,
    pub amount_id: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            form_id: "payment-form".to_string(),
            mount_selector: "#card-element".to_string(),
            button_id: "pay-button".to_string(),
            icon_id: "pay-icon".to_string(),
            errors_id: "stripe-errors".to_string(),
            amount_id: "dollar-amount".to_string(),
        }
    }
}

/// Style options forwarded to the card element, in the provider's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    pub base: InputStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<InputStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputStyle {
    pub font_size: String,
    pub line_height: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Default for InputStyle {
    fn default() -> Self {
        Self {
            font_size: "16px".to_string(),
            line_height: "24px".to_string(),
            color: None,
        }
    }
}
