//! Static exchange-rate snapshot used for base-currency normalization.

use std::collections::HashMap;

/// Rates into the base currency, captured once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    base: String,
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    /// Codes are case-insensitive. Non-positive or non-finite rates are dropped.
    pub fn new(base: &str, rates: &HashMap<String, f64>) -> Self {
        let rates = rates
            .iter()
            .filter(|(_, rate)| rate.is_finite() && **rate > 0.0)
            .map(|(code, rate)| (code.trim().to_ascii_uppercase(), *rate))
            .collect();
        Self {
            base: base.trim().to_ascii_uppercase(),
            rates,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Units of base currency per unit of `currency`.
    pub fn rate(&self, currency: &str) -> Option<f64> {
        let code = currency.trim().to_ascii_uppercase();
        if code.is_empty() || code == self.base {
            return Some(1.0);
        }
        self.rates.get(&code).copied()
    }

    /// `amount` converted to base; `None` when the rate is unknown.
    pub fn to_base(&self, amount: f64, currency: &str) -> Option<f64> {
        self.rate(currency).map(|rate| amount * rate)
    }
}
