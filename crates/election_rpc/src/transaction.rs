use std::str::FromStr;

use primitives::{Address, Method, Nonce, PublicKey, SecretKey, Signature, TxHash};
use secp256k1::{Message, SECP256K1};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

type H = secp256k1::hashes::sha256::Hash;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("unable to encode transaction: {0}")]
    Encoding(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("sender {0} does not match the signing key")]
    SenderMismatch(Address),
}

/// Contract invocation as it is signed by the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub from: Address,
    pub public_key: String,
    pub contract: Address,
    pub nonce: Nonce,
    pub method: Method,
    pub args: Vec<Value>,
}

impl UnsignedTransaction {
    fn message(&self) -> Result<Message, TransactionError> {
        let payload =
            serde_json::to_vec(self).map_err(|err| TransactionError::Encoding(err.to_string()))?;

        Ok(Message::from_hashed_data::<H>(&payload))
    }

    pub fn sign(self, secret_key: &SecretKey) -> Result<SignedTransaction, TransactionError> {
        let msg = self.message()?;
        let signature = secret_key.sign_ecdsa(msg);

        Ok(SignedTransaction {
            payload: self,
            signature: signature.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub payload: UnsignedTransaction,
    pub signature: String,
}

impl SignedTransaction {
    /// sha256 over the full signed encoding.
    pub fn hash(&self) -> Result<TxHash, TransactionError> {
        let encoded =
            serde_json::to_vec(self).map_err(|err| TransactionError::Encoding(err.to_string()))?;

        Ok(TxHash::from_digest(&Sha256::digest(encoded)))
    }

    pub fn verify(&self) -> Result<(), TransactionError> {
        let public_key = PublicKey::from_str(&self.payload.public_key)
            .map_err(|err| TransactionError::InvalidPublicKey(err.to_string()))?;

        if Address::new(public_key) != self.payload.from {
            return Err(TransactionError::SenderMismatch(self.payload.from));
        }

        let signature = Signature::from_str(&self.signature)
            .map_err(|err| TransactionError::InvalidSignature(err.to_string()))?;

        SECP256K1
            .verify_ecdsa(&self.payload.message()?, &signature, &public_key)
            .map_err(|err| TransactionError::InvalidSignature(err.to_string()))
    }
}
