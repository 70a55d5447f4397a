use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// API key pair for the exchange account.
///
/// Neither half is ever printed; `Debug` output is redacted.
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_redacted() {
        let credentials = Credentials::new("my-key", "my-secret");
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("my-key"));
        assert!(!printed.contains("my-secret"));
        assert_eq!(credentials.api_key(), "my-key");
        assert_eq!(credentials.api_secret(), "my-secret");
    }
}
