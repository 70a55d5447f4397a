//! Read-only metrics derived from the published snapshot.

use crate::coordinator::CoordinatorState;
use crate::core::currency::{Currency, CurrencySelection};
use crate::core::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

pub const TOTAL_METRIC_ID: &str = "bitcoin_de_total_eur";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyAttributes {
    pub currency_name: String,
    pub available_amount: f64,
    pub reserved_amount: f64,
    pub total_amount: f64,
    pub eur_rate: f64,
    pub eur_balance: f64,
}

/// Holdings of one selected currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyMetric {
    pub unique_id: String,
    pub name: String,
    pub state: f64,
    pub unit: String,
    pub attributes: CurrencyAttributes,
}

/// Whole-account value in EUR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalMetric {
    pub unique_id: String,
    pub name: String,
    pub state: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSet {
    /// False when the latest refresh failed and these values are stale.
    pub available: bool,
    pub fetched_at: DateTime<Utc>,
    pub currencies: Vec<CurrencyMetric>,
    pub total: TotalMetric,
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn currency_metric(snapshot: &Snapshot, currency: Currency) -> CurrencyMetric {
    let code = currency.code();
    let balance = snapshot.balance(code).cloned().unwrap_or_default();
    let total_amount = to_f64(balance.total_amount);

    CurrencyMetric {
        unique_id: format!("bitcoin_de_{code}"),
        name: format!("Bitcoin.de {} Balance", code.to_uppercase()),
        state: total_amount,
        unit: code.to_uppercase(),
        attributes: CurrencyAttributes {
            currency_name: currency.name().to_string(),
            available_amount: to_f64(balance.available_amount),
            reserved_amount: to_f64(balance.reserved_amount),
            total_amount,
            eur_rate: snapshot.eur_rate(code),
            eur_balance: snapshot.eur_value(code),
        },
    }
}

/// Builds one metric per selected currency, in selection order, plus the total.
pub fn build_metrics(
    snapshot: &Snapshot,
    selection: &CurrencySelection,
    available: bool,
) -> MetricSet {
    MetricSet {
        available,
        fetched_at: snapshot.fetched_at(),
        currencies: selection
            .iter()
            .map(|currency| currency_metric(snapshot, currency))
            .collect(),
        total: TotalMetric {
            unique_id: TOTAL_METRIC_ID.to_string(),
            name: "Bitcoin.de Total Balance".to_string(),
            state: snapshot.total_balance_eur(),
            unit: "EUR".to_string(),
        },
    }
}

/// Metrics for the coordinator's current state, `None` before the first
/// successful refresh.
pub fn from_state(state: &CoordinatorState, selection: &CurrencySelection) -> Option<MetricSet> {
    state
        .snapshot
        .as_ref()
        .map(|snapshot| build_metrics(snapshot, selection, state.last_update_success))
}
