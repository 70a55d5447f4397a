//! Currencies tradeable on the exchange and the user's selection of them

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Btc,
    Bch,
    Btg,
    Eth,
    Ltc,
    Xrp,
    Doge,
    Sol,
    Trx,
    Usdt,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Btc,
        Currency::Bch,
        Currency::Btg,
        Currency::Eth,
        Currency::Ltc,
        Currency::Xrp,
        Currency::Doge,
        Currency::Sol,
        Currency::Trx,
        Currency::Usdt,
    ];

    /// Lowercase code as used in exchange URLs and balance keys.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Btc => "btc",
            Currency::Bch => "bch",
            Currency::Btg => "btg",
            Currency::Eth => "eth",
            Currency::Ltc => "ltc",
            Currency::Xrp => "xrp",
            Currency::Doge => "doge",
            Currency::Sol => "sol",
            Currency::Trx => "trx",
            Currency::Usdt => "usdt",
        }
    }

    /// Human readable name shown next to the code.
    pub fn name(&self) -> &'static str {
        match self {
            Currency::Btc => "Bitcoin",
            Currency::Bch => "Bitcoin Cash",
            Currency::Btg => "Bitcoin Gold",
            Currency::Eth => "Ether",
            Currency::Ltc => "Litecoin",
            Currency::Xrp => "Ripple",
            Currency::Doge => "Dogecoin",
            Currency::Sol => "Solana",
            Currency::Trx => "Tron",
            Currency::Usdt => "Tether (ETH-Chain)",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| anyhow!("Unsupported currency: {}", s))
    }
}

impl TryFrom<String> for Currency {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

/// Ordered, duplicate-free list of currencies to track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Currency>", into = "Vec<Currency>")]
pub struct CurrencySelection(Vec<Currency>);

impl CurrencySelection {
    pub fn iter(&self) -> impl Iterator<Item = Currency> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Currency> for CurrencySelection {
    fn from_iter<I: IntoIterator<Item = Currency>>(iter: I) -> Self {
        let mut currencies = Vec::new();
        for currency in iter {
            if !currencies.contains(&currency) {
                currencies.push(currency);
            }
        }
        CurrencySelection(currencies)
    }
}

impl From<Vec<Currency>> for CurrencySelection {
    fn from(currencies: Vec<Currency>) -> Self {
        currencies.into_iter().collect()
    }
}

impl From<CurrencySelection> for Vec<Currency> {
    fn from(selection: CurrencySelection) -> Self {
        selection.0
    }
}

/// Parses a comma separated list such as `btc,ETH, sol`.
impl FromStr for CurrencySelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(Currency::from_str)
            .collect()
    }
}
