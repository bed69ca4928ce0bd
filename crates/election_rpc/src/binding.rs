use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use jsonrpsee::{core::client::Client, types::error::CallError};
use primitives::{Address, Method, Nonce, Receipt, TxHash};
use serde_json::Value;
use telemetry::{debug, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    rpc::{
        api::ElectionApiClient,
        client::create_client,
        CALL_EXECUTION_CODE,
        INVALID_SIGNATURE_CODE,
        NONCE_MISMATCH_CODE,
    },
    SignedTransaction,
};

pub type BindingResult<T> = std::result::Result<T, BindingError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("transaction rejected ({code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("contract call failed: {0}")]
    Execution(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl From<jsonrpsee::core::Error> for BindingError {
    fn from(err: jsonrpsee::core::Error) -> Self {
        use jsonrpsee::core::Error;

        match err {
            Error::Transport(err) => BindingError::Unreachable(err.to_string()),
            Error::RestartNeeded(reason) => BindingError::Unreachable(reason),
            Error::RequestTimeout => BindingError::Timeout,
            Error::Call(CallError::Custom(obj)) => match obj.code() {
                INVALID_SIGNATURE_CODE | NONCE_MISMATCH_CODE => BindingError::Rejected {
                    code: obj.code(),
                    message: obj.message().to_string(),
                },
                CALL_EXECUTION_CODE => BindingError::Execution(obj.message().to_string()),
                _ => BindingError::Rpc(obj.message().to_string()),
            },
            other => BindingError::Rpc(other.to_string()),
        }
    }
}

/// Typed access to the deployed election contract.
#[async_trait]
pub trait ContractBinding: Debug + Send + Sync {
    fn contract_address(&self) -> Address;

    /// Executes a read-only method.
    async fn call(&self, method: Method, args: Vec<Value>) -> BindingResult<Value>;

    /// Broadcasts a signed state-changing invocation.
    async fn send(&self, txn: SignedTransaction) -> BindingResult<TxHash>;

    async fn receipt(&self, tx_hash: &TxHash) -> BindingResult<Option<Receipt>>;

    async fn transaction_count(&self, address: &Address) -> BindingResult<Nonce>;
}

/// [`ContractBinding`] over a JSON-RPC websocket endpoint. The connection is
/// re-established on demand once it drops.
#[derive(Debug)]
pub struct RpcContractBinding {
    url: String,
    contract: Address,
    request_timeout: Duration,
    client: Mutex<Option<Arc<Client>>>,
}

impl RpcContractBinding {
    pub fn new(url: impl Into<String>, contract: Address, request_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            contract,
            request_timeout,
            client: Mutex::new(None),
        }
    }

    /// Builds the binding and opens the connection eagerly.
    pub async fn connect(
        url: impl Into<String>,
        contract: Address,
        request_timeout: Duration,
    ) -> BindingResult<Self> {
        let binding = Self::new(url, contract, request_timeout);
        binding.client().await?;

        Ok(binding)
    }

    async fn client(&self) -> BindingResult<Arc<Client>> {
        let mut guard = self.client.lock().await;

        if let Some(client) = guard.as_ref() {
            if client.is_connected() {
                return Ok(client.clone());
            }
            warn!(url = %self.url, "JSON-RPC connection dropped, reconnecting");
        }

        let client = create_client(&self.url, self.request_timeout)
            .await
            .map(Arc::new)
            .map_err(|err| BindingError::Unreachable(err.to_string()))?;

        debug!(url = %self.url, "connected to JSON-RPC endpoint");

        *guard = Some(client.clone());

        Ok(client)
    }
}

#[async_trait]
impl ContractBinding for RpcContractBinding {
    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn call(&self, method: Method, args: Vec<Value>) -> BindingResult<Value> {
        let client = self.client().await?;

        Ok(client.call(self.contract, method, args).await?)
    }

    async fn send(&self, txn: SignedTransaction) -> BindingResult<TxHash> {
        let client = self.client().await?;

        Ok(client.send_transaction(txn).await?)
    }

    async fn receipt(&self, tx_hash: &TxHash) -> BindingResult<Option<Receipt>> {
        let client = self.client().await?;

        Ok(client.get_transaction_receipt(tx_hash.clone()).await?)
    }

    async fn transaction_count(&self, address: &Address) -> BindingResult<Nonce> {
        let client = self.client().await?;

        Ok(client.get_transaction_count(*address).await?)
    }
}
