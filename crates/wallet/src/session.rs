use std::{fmt, sync::Arc};

use election_rpc::{BindingError, ContractBinding, UnsignedTransaction};
use primitives::{Address, ElectionId, Method, Nonce, PublicKey, SecretKey, VoterKey};
use secp256k1::SECP256K1;
use serde_json::Value;
use telemetry::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::{CredentialSource, Result, SessionError, TransactionHandle};

/// Holds the process' signing credential and turns contract invocations into
/// signed, broadcast transactions.
pub struct SignerSession {
    secret_key: SecretKey,
    public_key: PublicKey,
    address: Address,
    binding: Arc<dyn ContractBinding>,
    /// Next nonce to use. Held for the whole of a submission so nonces are
    /// handed out in order.
    nonce: Mutex<Nonce>,
}

impl fmt::Debug for SignerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerSession")
            .field("address", &self.address)
            .field("contract", &self.binding.contract_address())
            .finish_non_exhaustive()
    }
}

impl SignerSession {
    /// Loads the credential and syncs the account nonce from the network.
    pub async fn connect(
        binding: Arc<dyn ContractBinding>,
        credentials: &dyn CredentialSource,
    ) -> Result<Self> {
        let secret_key = credentials.secret_key()?;
        let public_key = secret_key.public_key(SECP256K1);
        let address = Address::new(public_key);

        let nonce = binding.transaction_count(&address).await?;

        info!(%address, nonce, "signer session ready");

        Ok(Self {
            secret_key,
            public_key,
            address,
            binding,
            nonce: Mutex::new(nonce),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn binding(&self) -> &Arc<dyn ContractBinding> {
        &self.binding
    }

    /// The voter key this session's identity uses in `election_id`.
    pub fn voter_key(&self, election_id: ElectionId) -> VoterKey {
        VoterKey::derive(&self.address, election_id)
    }

    pub async fn next_nonce(&self) -> Nonce {
        *self.nonce.lock().await
    }

    /// Signs `method(args)` and makes exactly one broadcast attempt. The nonce
    /// only advances when the network accepted the transaction.
    pub async fn sign_and_submit(&self, method: Method, args: Vec<Value>) -> Result<TransactionHandle> {
        if method.is_read_only() {
            return Err(SessionError::InvalidRequest(format!(
                "{method} is read-only and cannot be submitted"
            )));
        }

        if !method.accepts_arity(args.len()) {
            return Err(SessionError::InvalidRequest(format!(
                "{method} does not take {} arguments",
                args.len()
            )));
        }

        let mut nonce = self.nonce.lock().await;

        let txn = UnsignedTransaction {
            from: self.address,
            public_key: self.public_key.to_string(),
            contract: self.binding.contract_address(),
            nonce: *nonce,
            method,
            args,
        }
        .sign(&self.secret_key)
        .map_err(|err| SessionError::Signing(err.to_string()))?;

        debug!(%method, nonce = *nonce, "submitting transaction");

        match self.binding.send(txn).await {
            Ok(tx_hash) => {
                *nonce += 1;
                info!(%method, %tx_hash, "transaction submitted");

                Ok(TransactionHandle::new(tx_hash, method))
            },
            Err(err @ BindingError::Rejected { .. }) => {
                error!(%method, "transaction rejected: {err}");

                // the local nonce may have drifted from the chain
                match self.binding.transaction_count(&self.address).await {
                    Ok(synced) => *nonce = synced,
                    Err(sync_err) => warn!("unable to resync nonce: {sync_err}"),
                }

                Err(err.into())
            },
            Err(err) => {
                warn!(%method, "submission failed: {err}");
                Err(err.into())
            },
        }
    }
}
