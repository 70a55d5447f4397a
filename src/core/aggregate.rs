//! Converts balances to EUR and sums them into an account total.
use crate::core::snapshot::{Balance, RateQuote};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;

/// EUR value of each held currency and their sum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Valuation {
    pub per_currency: BTreeMap<String, f64>,
    pub total: f64,
}

/// Normalizes an optional quote to a single rate. Missing quotes resolve to 0.
pub fn resolve_rate(quote: Option<&RateQuote>) -> f64 {
    quote.map_or(0.0, RateQuote::value)
}

/// Values every currency in `balances` at its EUR rate.
///
/// The total covers the full balance set, including currencies that were not
/// selected for rate lookup; those contribute 0. This never fails.
pub fn aggregate(
    balances: &BTreeMap<String, Balance>,
    eur_rates: &BTreeMap<String, Option<RateQuote>>,
) -> Valuation {
    let mut valuation = Valuation::default();

    for (code, balance) in balances {
        let rate = resolve_rate(eur_rates.get(code).and_then(Option::as_ref));
        let amount = balance.total_amount.to_f64().unwrap_or(0.0);
        let value = amount * rate;
        valuation.total += value;
        valuation.per_currency.insert(code.clone(), value);
    }

    valuation
}
