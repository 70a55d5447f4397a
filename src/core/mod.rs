//! Core business logic abstractions

pub mod aggregate;
pub mod config;
pub mod credentials;
pub mod currency;
pub mod error;
pub mod exchange;
pub mod log;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use credentials::Credentials;
pub use currency::{Currency, CurrencySelection};
pub use error::{ExchangeError, RefreshError};
pub use exchange::{AccountProvider, RateProvider};
pub use snapshot::{Balance, RateQuote, Snapshot, WeightedRate};
