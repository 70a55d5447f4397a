//! One refresh cycle: account balances, per-currency EUR rates, snapshot.

use crate::core::currency::CurrencySelection;
use crate::core::error::RefreshError;
use crate::core::exchange::{AccountProvider, RateProvider};
use crate::core::snapshot::{RateQuote, Snapshot};
use crate::providers::BitcoinDeClient;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Anything that can produce a fresh [`Snapshot`] for a currency selection.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn refresh(&self, currencies: &CurrencySelection) -> Result<Snapshot, RefreshError>;
}

pub struct BalanceFetcher {
    accounts: Arc<dyn AccountProvider>,
    rates: Arc<dyn RateProvider>,
}

impl BalanceFetcher {
    pub fn new(accounts: Arc<dyn AccountProvider>, rates: Arc<dyn RateProvider>) -> Self {
        Self { accounts, rates }
    }

    pub fn from_client(client: BitcoinDeClient) -> Self {
        let client = Arc::new(client);
        Self::new(Arc::clone(&client) as Arc<dyn AccountProvider>, client)
    }

    /// Looks up every selected rate concurrently. A failed lookup is logged and
    /// recorded as `None`; it never fails the cycle.
    async fn fetch_rates(&self, currencies: &CurrencySelection) -> BTreeMap<String, Option<RateQuote>> {
        let lookups = currencies.iter().map(|currency| async move {
            let quote = match self.rates.fetch_eur_rate(currency).await {
                Ok(quote) => Some(quote),
                Err(e) => {
                    warn!(%currency, error = %e, "Error fetching EUR rate");
                    None
                }
            };
            (currency.code().to_string(), quote)
        });

        join_all(lookups).await.into_iter().collect()
    }
}

#[async_trait]
impl SnapshotSource for BalanceFetcher {
    #[instrument(name = "BalanceRefresh", skip_all, fields(currencies = currencies.len()))]
    async fn refresh(&self, currencies: &CurrencySelection) -> Result<Snapshot, RefreshError> {
        let balances = self
            .accounts
            .fetch_balances()
            .await
            .map_err(RefreshError::FetchFailed)?;
        debug!(count = balances.len(), "Fetched account balances");

        let eur_rates = self.fetch_rates(currencies).await;
        let snapshot = Snapshot::new(balances, eur_rates);
        info!(
            total_balance_eur = snapshot.total_balance_eur(),
            "Refreshed bitcoin.de balances"
        );
        Ok(snapshot)
    }
}
