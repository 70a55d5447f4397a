//! Balances, rate quotes and the point-in-time snapshot built from them

use crate::core::aggregate::{self, Valuation};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Holdings of one currency as reported by the account endpoint.
///
/// `total_amount` is taken verbatim; the exchange rounds it independently of
/// the other two figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub available_amount: Decimal,
    #[serde(default)]
    pub reserved_amount: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
}

/// Structured quote with rates averaged over recent trades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedRate {
    pub rate_weighted: Option<f64>,
    pub rate_weighted_3h: Option<f64>,
    pub rate_weighted_12h: Option<f64>,
}

/// EUR rate for a currency, in either of the shapes the rate endpoint returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum RateQuote {
    Direct(f64),
    Weighted(WeightedRate),
}

impl RateQuote {
    /// Normalized rate; a weighted quote without a usable `rate_weighted` is 0.
    pub fn value(&self) -> f64 {
        match self {
            RateQuote::Direct(rate) => *rate,
            RateQuote::Weighted(quote) => quote.rate_weighted.unwrap_or(0.0),
        }
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

impl TryFrom<Value> for RateQuote {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => {
                let field = |name: &str| fields.get(name).and_then(lenient_f64);
                Ok(RateQuote::Weighted(WeightedRate {
                    rate_weighted: field("rate_weighted"),
                    rate_weighted_3h: field("rate_weighted_3h"),
                    rate_weighted_12h: field("rate_weighted_12h"),
                }))
            }
            other => lenient_f64(&other)
                .map(RateQuote::Direct)
                .ok_or_else(|| format!("expected a numeric rate, got {other}")),
        }
    }
}

/// Immutable result of one refresh cycle.
///
/// Balances and rates are keyed by lowercase currency code. A `None` rate
/// marks a lookup that failed during the cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    balances: BTreeMap<String, Balance>,
    eur_rates: BTreeMap<String, Option<RateQuote>>,
    valuation: Valuation,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        balances: BTreeMap<String, Balance>,
        eur_rates: BTreeMap<String, Option<RateQuote>>,
    ) -> Self {
        let valuation = aggregate::aggregate(&balances, &eur_rates);
        Self {
            balances,
            eur_rates,
            valuation,
            fetched_at: Utc::now(),
        }
    }

    pub fn balances(&self) -> &BTreeMap<String, Balance> {
        &self.balances
    }

    pub fn balance(&self, code: &str) -> Option<&Balance> {
        self.balances.get(code)
    }

    pub fn eur_rates(&self) -> &BTreeMap<String, Option<RateQuote>> {
        &self.eur_rates
    }

    /// Resolved EUR rate, 0 when absent or unavailable.
    pub fn eur_rate(&self, code: &str) -> f64 {
        aggregate::resolve_rate(self.eur_rates.get(code).and_then(Option::as_ref))
    }

    /// EUR value of the holdings in `code`, 0 when the account holds none.
    pub fn eur_value(&self, code: &str) -> f64 {
        self.valuation
            .per_currency
            .get(code)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total_balance_eur(&self) -> f64 {
        self.valuation.total
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[derive(Deserialize)]
    struct Wrapper {
        rate: RateQuote,
    }

    fn parse(json: &str) -> Result<RateQuote, serde_json::Error> {
        serde_json::from_str::<Wrapper>(json).map(|w| w.rate)
    }

    #[test]
    fn test_direct_rate_from_string_and_number() {
        assert_eq!(parse(r#"{"rate": "20000"}"#).unwrap(), RateQuote::Direct(20000.0));
        assert_eq!(parse(r#"{"rate": 1.25}"#).unwrap(), RateQuote::Direct(1.25));
    }

    #[test]
    fn test_weighted_rate() {
        let quote = parse(
            r#"{"currency_pair": "btceur", "rate": {"rate_weighted": "3.2", "rate_weighted_3h": "3.1", "rate_weighted_12h": 3.0}}"#,
        )
        .unwrap();
        assert_eq!(
            quote,
            RateQuote::Weighted(WeightedRate {
                rate_weighted: Some(3.2),
                rate_weighted_3h: Some(3.1),
                rate_weighted_12h: Some(3.0),
            })
        );
        assert_eq!(quote.value(), 3.2);
    }

    #[test]
    fn test_weighted_rate_without_usable_value_is_zero() {
        assert_eq!(parse(r#"{"rate": {}}"#).unwrap().value(), 0.0);
        assert_eq!(
            parse(r#"{"rate": {"rate_weighted": "n/a"}}"#)
                .unwrap()
                .value(),
            0.0
        );
    }

    #[test]
    fn test_unusable_rate_shapes_are_errors() {
        assert!(parse(r#"{"rate": "abc"}"#).is_err());
        assert!(parse(r#"{"rate": null}"#).is_err());
        assert!(parse(r#"{"rate": [1, 2]}"#).is_err());
        assert!(parse(r#"{"price": 5}"#).is_err());
    }

    #[test]
    fn test_non_finite_rates_are_rejected() {
        for raw in ["NaN", "inf", "-infinity", "Infinity"] {
            let json = format!(r#"{{"rate": "{raw}"}}"#);
            assert!(parse(&json).is_err(), "{raw} should not parse as a rate");
        }

        let weighted = parse(r#"{"rate": {"rate_weighted": "NaN", "rate_weighted_3h": "2.5"}}"#).unwrap();
        assert_eq!(weighted.value(), 0.0);
    }

    #[test]
    fn test_balance_accepts_strings_numbers_and_missing_fields() {
        let balance: Balance = serde_json::from_str(
            r#"{"available_amount": "1.0", "reserved_amount": 0.5, "total_amount": "1.5", "extra": true}"#,
        )
        .unwrap();
        assert_eq!(balance.available_amount, Decimal::from_str("1.0").unwrap());
        assert_eq!(balance.reserved_amount, Decimal::from_str("0.5").unwrap());
        assert_eq!(balance.total_amount, Decimal::from_str("1.5").unwrap());

        let partial: Balance = serde_json::from_str(r#"{"total_amount": "2"}"#).unwrap();
        assert_eq!(partial.available_amount, Decimal::ZERO);
        assert_eq!(partial.total_amount, Decimal::from(2));
    }

    #[test]
    fn test_snapshot_accessors() {
        let mut balances = BTreeMap::new();
        balances.insert(
            "btc".to_string(),
            Balance {
                total_amount: Decimal::from_str("1.5").unwrap(),
                ..Balance::default()
            },
        );
        let mut rates = BTreeMap::new();
        rates.insert("btc".to_string(), Some(RateQuote::Direct(20000.0)));
        rates.insert("eth".to_string(), None);

        let snapshot = Snapshot::new(balances, rates);
        assert_eq!(snapshot.total_balance_eur(), 30000.0);
        assert_eq!(snapshot.eur_rate("btc"), 20000.0);
        assert_eq!(snapshot.eur_value("btc"), 30000.0);
        assert_eq!(snapshot.eur_rate("eth"), 0.0);
        assert_eq!(snapshot.eur_value("eth"), 0.0);
        assert!(snapshot.balance("eth").is_none());
    }
}
