//! HTTP client for the bitcoin.de v4 account and rate endpoints.

use crate::core::credentials::Credentials;
use crate::core::currency::Currency;
use crate::core::error::ExchangeError;
use crate::core::exchange::{AccountProvider, RateProvider};
use crate::core::snapshot::{Balance, RateQuote};
use crate::providers::signer::{self, HEADER_API_KEY, HEADER_API_NONCE, HEADER_API_SIGNATURE};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

const ACCOUNT_ENDPOINT: &str = "account";

#[derive(Deserialize, Debug)]
struct AccountResponse {
    data: AccountData,
}

#[derive(Deserialize, Debug)]
struct AccountData {
    #[serde(default)]
    balances: BTreeMap<String, Balance>,
}

#[derive(Deserialize, Debug)]
struct RateResponse {
    rate: RateQuote,
}

/// Client for the bitcoin.de v4 API.
///
/// Serves both the signed account endpoint and the public per-currency rate
/// endpoint, which authenticates through an `apikey` query parameter.
pub struct BitcoinDeClient {
    base_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl BitcoinDeClient {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bdtrack/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(ExchangeError::Client)?;

        Ok(BitcoinDeClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    pub fn account_url(&self) -> String {
        format!("{}/v4/account", self.base_url)
    }

    pub fn rate_url(&self, currency: Currency) -> String {
        format!(
            "{}/v4/{}eur/basic/rate.json?apikey={}",
            self.base_url,
            currency.code(),
            self.credentials.api_key()
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ExchangeError> {
        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::from_request(endpoint, e))?;

        let status = response.status();
        debug!(%status, endpoint, "Received bitcoin.de response");
        if !status.is_success() {
            return Err(ExchangeError::from_status(endpoint, status));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ExchangeError::from_request(endpoint, e))?;

        serde_json::from_str(&text).map_err(|source| ExchangeError::Malformed {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
impl AccountProvider for BitcoinDeClient {
    #[instrument(name = "BitcoinDeAccountFetch", skip(self))]
    async fn fetch_balances(&self) -> Result<BTreeMap<String, Balance>, ExchangeError> {
        let url = self.account_url();
        let headers = signer::sign(&Method::GET, &url, &self.credentials, b"")?;
        debug!(nonce = %headers.nonce, "Requesting account balances");

        let request = self
            .client
            .get(&url)
            .header(HEADER_API_KEY, headers.api_key.as_str())
            .header(HEADER_API_NONCE, headers.nonce.as_str())
            .header(HEADER_API_SIGNATURE, headers.signature.as_str());

        let response: AccountResponse = self.get_json(request, ACCOUNT_ENDPOINT).await?;
        Ok(response
            .data
            .balances
            .into_iter()
            .map(|(code, balance)| (code.to_lowercase(), balance))
            .collect())
    }
}

#[async_trait]
impl RateProvider for BitcoinDeClient {
    #[instrument(name = "BitcoinDeRateFetch", skip_all, fields(currency = %currency))]
    async fn fetch_eur_rate(&self, currency: Currency) -> Result<RateQuote, ExchangeError> {
        let endpoint = format!("{}eur rate", currency.code());
        debug!("Requesting EUR rate");

        let request = self.client.get(self.rate_url(currency));
        let response: RateResponse = self.get_json(request, &endpoint).await?;
        Ok(response.rate)
    }
}
