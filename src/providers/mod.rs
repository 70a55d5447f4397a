pub mod bitcoin_de;
pub mod signer;

pub use bitcoin_de::BitcoinDeClient;
