use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::{Error, PublicKey};

/// Represents the lower 20 bytes of a secp256k1 public key hashed with
/// keccak256. Accounts and contracts share this format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn new(public_key: PublicKey) -> Self {
        Self::from(public_key)
    }
}

impl From<PublicKey> for Address {
    fn from(item: PublicKey) -> Self {
        let mut hasher = Keccak256::new();
        let pk_bytes = item.serialize_uncompressed();
        hasher.update(&pk_bytes[1..]);
        let hash = hasher.finalize();

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[(hash.len() - 20)..]);
        Address(address_bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAddress(s.to_string());

        let stripped = s.strip_prefix("0x").ok_or_else(invalid)?;
        let address_bytes = hex::decode(stripped).map_err(|_| invalid())?;

        let address: [u8; 20] = address_bytes.try_into().map_err(|_| invalid())?;

        Ok(Address(address))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
