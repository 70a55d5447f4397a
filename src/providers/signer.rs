//! Request authentication for the bitcoin.de trading API.
//!
//! Every signed request carries the API key, a nonce and an HMAC-SHA256
//! signature over `METHOD#URL#APIKEY#NONCE#MD5(BODY)`.

use crate::core::credentials::Credentials;
use crate::core::error::ExchangeError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use reqwest::Method;
use sha2::Sha256;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

pub const HEADER_API_KEY: &str = "X-API-KEY";
pub const HEADER_API_NONCE: &str = "X-API-NONCE";
pub const HEADER_API_SIGNATURE: &str = "X-API-SIGNATURE";

static LAST_NONCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub nonce: String,
    pub signature: String,
}

/// Current Unix time in microseconds, bumped past the last value handed out.
///
/// The exchange rejects a nonce that is not greater than the previous one, so
/// this stays strictly increasing even if the wall clock steps backwards.
pub fn next_nonce() -> u64 {
    let micros = Utc::now().timestamp_micros();
    let now = u64::try_from(micros).unwrap_or_else(|_| {
        warn!(micros, "System clock is before the Unix epoch; nonce continues from the last value");
        0
    });
    let mut last = LAST_NONCE.load(Ordering::Acquire);
    loop {
        let candidate = now.max(last + 1);
        match LAST_NONCE.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Hex MD5 of the request body; GET requests hash the empty string.
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

pub fn sign_with_nonce(
    method: &Method,
    url: &str,
    api_key: &str,
    api_secret: &str,
    nonce: u64,
    body_digest: &str,
) -> Result<String, ExchangeError> {
    let payload = format!("{}#{url}#{api_key}#{nonce}#{body_digest}", method.as_str());
    let mut mac = Hmac::<Sha256>::new_from_slice(api_secret.as_bytes())?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds the authentication headers for one request.
pub fn sign(
    method: &Method,
    url: &str,
    credentials: &Credentials,
    body: &[u8],
) -> Result<SignedHeaders, ExchangeError> {
    let nonce = next_nonce();
    let signature = sign_with_nonce(
        method,
        url,
        credentials.api_key(),
        credentials.api_secret(),
        nonce,
        &body_digest(body),
    )?;

    Ok(SignedHeaders {
        api_key: credentials.api_key().to_string(),
        nonce: nonce.to_string(),
        signature,
    })
}
