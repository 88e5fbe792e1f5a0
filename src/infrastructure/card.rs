//! Card input checks performed by the simulated card element.
//!
//! The hosted element validates as the user types: change events carry only
//! *invalid* input, while tokenization also rejects *incomplete* input.

use crate::domain::credential::CardSummary;
use crate::domain::widget::{CardBrand, ProviderFault};
use serde::Deserialize;

/// Raw contents of the card element's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CardInput {
    pub number: String,
    /// `MM/YY`, spaces ignored.
    pub expiry: String,
    pub cvc: String,
}

impl CardInput {
    pub fn new(number: &str, expiry: &str, cvc: &str) -> Self {
        Self {
            number: number.to_string(),
            expiry: expiry.to_string(),
            cvc: cvc.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.number.trim().is_empty() && self.expiry.trim().is_empty() && self.cvc.trim().is_empty()
    }
}

/// Result of checking the whole element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardCheck {
    pub empty: bool,
    pub complete: bool,
    pub brand: CardBrand,
    /// First invalid field, if any. Incomplete fields are not reported here.
    pub error: Option<ProviderFault>,
}

enum Field<T> {
    Complete(T),
    Incomplete(ProviderFault),
    Invalid(ProviderFault),
}

pub fn detect_brand(digits: &str) -> CardBrand {
    let prefix2: u32 = digits.get(..2).and_then(|p| p.parse().ok()).unwrap_or(0);
    let prefix4: u32 = digits.get(..4).and_then(|p| p.parse().ok()).unwrap_or(0);

    if digits.starts_with('4') {
        CardBrand::Visa
    } else if (51..=55).contains(&prefix2) || (2221..=2720).contains(&prefix4) {
        CardBrand::Mastercard
    } else if prefix2 == 34 || prefix2 == 37 {
        CardBrand::Amex
    } else if prefix4 == 6011 || prefix2 == 65 {
        CardBrand::Discover
    } else {
        CardBrand::Unknown
    }
}

pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

fn number_length(brand: CardBrand) -> usize {
    match brand {
        CardBrand::Amex => 15,
        _ => 16,
    }
}

fn cvc_length(brand: CardBrand) -> usize {
    match brand {
        CardBrand::Amex => 4,
        _ => 3,
    }
}

fn check_number(raw: &str) -> Field<(String, CardBrand)> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || {
        Field::Invalid(ProviderFault::validation(
            "invalid_number",
            "Your card number is invalid.",
        ))
    };

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return invalid();
    }
    let brand = detect_brand(&digits);
    let expected = number_length(brand);
    if digits.len() < expected {
        return Field::Incomplete(ProviderFault::validation(
            "incomplete_number",
            "Your card number is incomplete.",
        ));
    }
    if digits.len() > expected || !luhn_valid(&digits) {
        return invalid();
    }
    Field::Complete((digits, brand))
}

fn check_expiry(raw: &str, today: (u16, u8)) -> Field<(u8, u16)> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let incomplete = || {
        Field::Incomplete(ProviderFault::validation(
            "incomplete_expiry",
            "Your card's expiration date is incomplete.",
        ))
    };

    let Some((month, year)) = compact.split_once('/') else {
        return incomplete();
    };
    if month.len() != 2 || year.len() != 2 {
        return incomplete();
    }
    let (Ok(month), Ok(year)) = (month.parse::<u8>(), year.parse::<u16>()) else {
        return Field::Invalid(ProviderFault::validation(
            "invalid_expiry_month",
            "Your card's expiration date is invalid.",
        ));
    };
    if !(1..=12).contains(&month) {
        return Field::Invalid(ProviderFault::validation(
            "invalid_expiry_month",
            "Your card's expiration date is invalid.",
        ));
    }

    let year = 2000 + year;
    let (this_year, this_month) = today;
    if year < this_year {
        return Field::Invalid(ProviderFault::validation(
            "invalid_expiry_year_past",
            "Your card's expiration year is in the past.",
        ));
    }
    if year == this_year && month < this_month {
        return Field::Invalid(ProviderFault::validation(
            "invalid_expiry_month_past",
            "Your card's expiration date is in the past.",
        ));
    }
    Field::Complete((month, year))
}

fn check_cvc(raw: &str, brand: CardBrand) -> Field<()> {
    let cvc = raw.trim();
    let expected = cvc_length(brand);
    if !cvc.chars().all(|c| c.is_ascii_digit()) || cvc.len() > expected {
        return Field::Invalid(ProviderFault::validation(
            "invalid_cvc",
            "Your card's security code is invalid.",
        ));
    }
    if cvc.len() < expected {
        return Field::Incomplete(ProviderFault::validation(
            "incomplete_cvc",
            "Your card's security code is incomplete.",
        ));
    }
    Field::Complete(())
}

/// Checks the element as a change event would report it.
pub fn check(input: &CardInput, today: (u16, u8)) -> CardCheck {
    let digits: String = input.number.chars().filter(|c| !c.is_whitespace()).collect();
    let brand = detect_brand(&digits);
    let mut complete = true;
    let mut error = None;

    let mut note = |incomplete: Option<ProviderFault>, invalid: Option<ProviderFault>| {
        if incomplete.is_some() {
            complete = false;
        }
        if let Some(fault) = invalid {
            complete = false;
            error.get_or_insert(fault);
        }
    };

    match check_number(&input.number) {
        Field::Complete(_) => {}
        Field::Incomplete(f) => note(Some(f), None),
        Field::Invalid(f) => note(None, Some(f)),
    }
    match check_expiry(&input.expiry, today) {
        Field::Complete(_) => {}
        Field::Incomplete(f) => note(Some(f), None),
        Field::Invalid(f) => note(None, Some(f)),
    }
    match check_cvc(&input.cvc, brand) {
        Field::Complete(_) => {}
        Field::Incomplete(f) => note(Some(f), None),
        Field::Invalid(f) => note(None, Some(f)),
    }

    CardCheck {
        empty: input.is_empty(),
        complete,
        brand,
        error,
    }
}

/// Checks the element for tokenization: the first incomplete or invalid field
/// fails the request.
pub fn summarize(input: &CardInput, today: (u16, u8)) -> Result<CardSummary, ProviderFault> {
    let (digits, brand) = match check_number(&input.number) {
        Field::Complete(number) => number,
        Field::Incomplete(fault) | Field::Invalid(fault) => return Err(fault),
    };
    let (exp_month, exp_year) = match check_expiry(&input.expiry, today) {
        Field::Complete(expiry) => expiry,
        Field::Incomplete(fault) | Field::Invalid(fault) => return Err(fault),
    };
    if let Field::Incomplete(fault) | Field::Invalid(fault) = check_cvc(&input.cvc, brand) {
        return Err(fault);
    }

    Ok(CardSummary {
        brand,
        last4: digits[digits.len() - 4..].to_string(),
        exp_month,
        exp_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: (u16, u8) = (2026, 10);

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4242424242424242"));
        assert!(luhn_valid("378282246310005"));
        assert!(!luhn_valid("4242424242424241"));
        assert!(!luhn_valid(""));
    }

    #[test]
    fn test_brand_detection() {
        assert_eq!(detect_brand("4242"), CardBrand::Visa);
        assert_eq!(detect_brand("5555555555554444"), CardBrand::Mastercard);
        assert_eq!(detect_brand("2223003122003222"), CardBrand::Mastercard);
        assert_eq!(detect_brand("378282246310005"), CardBrand::Amex);
        assert_eq!(detect_brand("6011111111111117"), CardBrand::Discover);
        assert_eq!(detect_brand("9"), CardBrand::Unknown);
    }

    #[test]
    fn test_partial_input_is_incomplete_without_error() {
        let result = check(&CardInput::new("4242 4242", "", ""), TODAY);
        assert!(!result.empty);
        assert!(!result.complete);
        assert_eq!(result.error, None);
        assert_eq!(result.brand, CardBrand::Visa);
    }

    #[test]
    fn test_invalid_number_reported_on_change() {
        let result = check(&CardInput::new("4242424242424241", "12/99", "123"), TODAY);
        let error = result.error.unwrap();
        assert_eq!(error.message, "Your card number is invalid.");
        assert_eq!(error.code.as_deref(), Some("invalid_number"));
    }

    #[test]
    fn test_expired_card() {
        let result = check(&CardInput::new("4242424242424242", "12/20", "123"), TODAY);
        assert_eq!(
            result.error.unwrap().message,
            "Your card's expiration year is in the past."
        );

        let result = check(&CardInput::new("4242424242424242", "09/26", "123"), TODAY);
        assert_eq!(
            result.error.unwrap().message,
            "Your card's expiration date is in the past."
        );
    }

    #[test]
    fn test_complete_card() {
        let result = check(&CardInput::new("4242 4242 4242 4242", "12 / 99", "123"), TODAY);
        assert!(result.complete);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_summarize_rejects_incomplete() {
        let fault = summarize(&CardInput::new("4242424242424242", "12/99", "1"), TODAY).unwrap_err();
        assert_eq!(fault.message, "Your card's security code is incomplete.");

        let fault = summarize(&CardInput::default(), TODAY).unwrap_err();
        assert_eq!(fault.message, "Your card number is incomplete.");
    }

    #[test]
    fn test_summarize_amex() {
        let summary = summarize(&CardInput::new("378282246310005", "01/30", "1234"), TODAY).unwrap();
        assert_eq!(summary.brand, CardBrand::Amex);
        assert_eq!(summary.last4, "0005");
        assert_eq!(summary.exp_month, 1);
        assert_eq!(summary.exp_year, 2030);
    }
}
