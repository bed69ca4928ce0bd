use std::{fmt, str::FromStr};

use primitives::{SecretKey, BALLOT_PRIVATE_KEY_VAR_NAME};

use crate::{Result, SessionError};

/// Supplies the secret a [`crate::SignerSession`] signs with. Implementations
/// must never log or persist the key.
pub trait CredentialSource: Send + Sync {
    fn secret_key(&self) -> Result<SecretKey>;
}

/// Reads a hex encoded secp256k1 secret key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var_name: String,
}

impl EnvCredentials {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(BALLOT_PRIVATE_KEY_VAR_NAME)
    }
}

impl CredentialSource for EnvCredentials {
    fn secret_key(&self) -> Result<SecretKey> {
        let raw = std::env::var(&self.var_name)
            .map_err(|_| SessionError::Signing(format!("{} is not set", self.var_name)))?;

        let raw = raw.trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);

        // the parse error is dropped so key material never ends up in a message
        SecretKey::from_str(raw).map_err(|_| {
            SessionError::Signing(format!("{} is not a valid secret key", self.var_name))
        })
    }
}

/// A key held in memory, e.g. one generated for tests or loaded by the host.
#[derive(Clone)]
pub struct StaticCredentials(SecretKey);

impl StaticCredentials {
    pub fn new(secret_key: SecretKey) -> Self {
        Self(secret_key)
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticCredentials").field(&"<redacted>").finish()
    }
}

impl CredentialSource for StaticCredentials {
    fn secret_key(&self) -> Result<SecretKey> {
        Ok(self.0)
    }
}
