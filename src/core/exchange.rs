//! Exchange data abstractions

use crate::core::currency::Currency;
use crate::core::error::ExchangeError;
use crate::core::snapshot::{Balance, RateQuote};
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Balances of every currency the account holds, keyed by lowercase code.
    async fn fetch_balances(&self) -> Result<BTreeMap<String, Balance>, ExchangeError>;
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_eur_rate(&self, currency: Currency) -> Result<RateQuote, ExchangeError>;
}
