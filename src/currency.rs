//! The currencies a user can choose to display their money in.

use std::{fmt::Display, str::FromStr};

use crate::Error;

/// The symbol used when a user has no currency set.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "£";

/// A display currency that users can pick when signing up or in their settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    /// British Pound.
    #[default]
    GBP,
    /// US Dollar.
    USD,
    /// Euro.
    EUR,
    /// Nigerian Naira.
    NGN,
    /// Ghanaian Cedi.
    GHS,
    /// Kenyan Shilling.
    KES,
    /// South African Rand.
    ZAR,
    /// Indian Rupee.
    INR,
    /// Canadian Dollar.
    CAD,
    /// Australian Dollar.
    AUD,
    /// Japanese Yen.
    JPY,
}

impl Currency {
    /// Every currency a user may choose, in the order they are listed in forms.
    pub const ALL: [Currency; 11] = [
        Currency::GBP,
        Currency::USD,
        Currency::EUR,
        Currency::NGN,
        Currency::GHS,
        Currency::KES,
        Currency::ZAR,
        Currency::INR,
        Currency::CAD,
        Currency::AUD,
        Currency::JPY,
    ];

    /// The ISO 4217 code, e.g. "GBP".
    pub fn code(&self) -> &'static str {
        match self {
            Currency::GBP => "GBP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::NGN => "NGN",
            Currency::GHS => "GHS",
            Currency::KES => "KES",
            Currency::ZAR => "ZAR",
            Currency::INR => "INR",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
        }
    }

    /// The symbol placed before amounts, e.g. "£".
    pub fn symbol(&self) -> &'static str {
        currency_symbol(self.code())
    }

    /// The human readable name shown in the currency select, e.g. "British Pound (£)".
    pub fn label(&self) -> String {
        let name = match self {
            Currency::GBP => "British Pound",
            Currency::USD => "US Dollar",
            Currency::EUR => "Euro",
            Currency::NGN => "Nigerian Naira",
            Currency::GHS => "Ghanaian Cedi",
            Currency::KES => "Kenyan Shilling",
            Currency::ZAR => "South African Rand",
            Currency::INR => "Indian Rupee",
            Currency::CAD => "Canadian Dollar",
            Currency::AUD => "Australian Dollar",
            Currency::JPY => "Japanese Yen",
        };

        format!("{name} ({})", self.symbol())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::InvalidCurrency(code.to_owned()))
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Look up the symbol for a currency code.
///
/// Codes that are not known are displayed as-is and a blank code falls back
/// to [DEFAULT_CURRENCY_SYMBOL].
pub fn currency_symbol(code: &str) -> &str {
    match code.trim() {
        "" => DEFAULT_CURRENCY_SYMBOL,
        "GBP" => "£",
        "USD" => "$",
        "EUR" => "€",
        "NGN" => "₦",
        "GHS" => "₵",
        "KES" => "KSh",
        "ZAR" => "R",
        "INR" => "₹",
        "CAD" => "$",
        "AUD" => "$",
        "JPY" => "¥",
        "CNY" => "¥",
        other => other,
    }
}

#[cfg(test)]
mod currency_tests {
    use std::str::FromStr;

    use crate::Error;

    use super::{Currency, currency_symbol};

    #[test]
    fn known_codes_map_to_symbols() {
        assert_eq!(currency_symbol("GBP"), "£");
        assert_eq!(currency_symbol("KES"), "KSh");
        assert_eq!(currency_symbol("CNY"), "¥");
    }

    #[test]
    fn unknown_code_falls_back_to_code() {
        assert_eq!(currency_symbol("CHF"), "CHF");
    }

    #[test]
    fn blank_code_falls_back_to_default() {
        assert_eq!(currency_symbol(""), "£");
        assert_eq!(currency_symbol("  "), "£");
    }

    #[test]
    fn parses_codes_ignoring_case() {
        assert_eq!(Currency::from_str("usd"), Ok(Currency::USD));
        assert_eq!(Currency::from_str(" JPY "), Ok(Currency::JPY));
    }

    #[test]
    fn rejects_codes_that_cannot_be_chosen() {
        assert_eq!(
            Currency::from_str("CNY"),
            Err(Error::InvalidCurrency("CNY".to_owned()))
        );
    }

    #[test]
    fn label_includes_symbol() {
        assert_eq!(Currency::NGN.label(), "Nigerian Naira (₦)");
        assert_eq!(Currency::default(), Currency::GBP);
    }
}
