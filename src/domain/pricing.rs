use crate::error::{CheckoutError, Result};
use rust_decimal::MathematicalOps;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat fee added to every purchase, in minor units.
pub const BASE_FEE: Decimal = dec!(150);
/// Volume discount exponent applied to the number of credits.
pub const VOLUME_EXPONENT: f64 = 0.95;

pub const PRICE_LIST_STEP: u32 = 100;
pub const PRICE_LIST_MAX: u32 = 100_000;

/// Cost of `units` credits in minor currency units (cents), rounded to a
/// whole cent.
///
/// # Errors
///
/// [`CheckoutError::PriceOverflow`] if the result does not fit a `Decimal`.
pub fn credit_cost(units: u32, cost_per_unit: Decimal) -> Result<Decimal> {
    let volume = if units == 0 {
        Some(Decimal::ZERO)
    } else {
        Decimal::from(units).checked_powf(VOLUME_EXPONENT)
    };
    volume
        .and_then(|volume| cost_per_unit.checked_mul(volume))
        .and_then(|cost| cost.checked_add(BASE_FEE))
        .map(|cost| cost.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(CheckoutError::PriceOverflow(units))
}

/// Costs for 100, 200, ... 100 000 credits.
pub fn price_list(cost_per_unit: Decimal) -> Result<BTreeMap<u32, Decimal>> {
    (PRICE_LIST_STEP..=PRICE_LIST_MAX)
        .step_by(PRICE_LIST_STEP as usize)
        .map(|units| Ok((units, credit_cost(units, cost_per_unit)?)))
        .collect()
}

/// Undiscounted cost of one credit per site.
pub fn cost_all_sites(total_sites: u32, cost_per_credit: Decimal) -> Result<Decimal> {
    Decimal::from(total_sites)
        .checked_mul(cost_per_credit)
        .ok_or(CheckoutError::PriceOverflow(total_sites))
}

/// Formats an amount given in minor units for the `#dollar-amount` display.
pub fn format_amount(cents: Decimal, currency: &str) -> String {
    let major = (cents / dec!(100)).round_dp(2);
    match currency.to_ascii_lowercase().as_str() {
        "usd" => format!("${:.2}", major),
        "eur" => format!("€{:.2}", major),
        "gbp" => format!("£{:.2}", major),
        other => format!("{:.2} {}", major, other.to_ascii_uppercase()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub credits: u32,
    pub amount: Decimal,
    pub currency: String,
}

impl Quote {
    /// Prices `credits` in `currency`. Fails if the amount overflows.
    pub fn new(credits: u32, cost_per_unit: Decimal, currency: &str) -> Result<Self> {
        Ok(Self {
            credits,
            amount: credit_cost(credits, cost_per_unit)?,
            currency: currency.to_ascii_lowercase(),
        })
    }

    /// The amount formatted for the page, e.g. `$2.21`.
    pub fn display(&self) -> String {
        format_amount(self.amount, &self.currency)
    }
}
