use jsonrpsee::proc_macros::rpc;
use primitives::{Address, Method, Nonce, Receipt, TxHash};
use serde_json::Value;

use crate::SignedTransaction;

pub type RpcResult<T> = std::result::Result<T, jsonrpsee::core::Error>;

/// JSON-RPC surface of a node hosting the election contract.
#[rpc(server, client, namespace = "election")]
pub trait ElectionApi {
    /// Broadcasts a signed contract invocation and returns its hash
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, txn: SignedTransaction) -> RpcResult<TxHash>;

    /// Returns the receipt of an included transaction, if any
    #[method(name = "getTransactionReceipt")]
    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<Receipt>>;

    /// Executes a read-only contract method
    #[method(name = "call")]
    async fn call(&self, contract: Address, method: Method, args: Vec<Value>) -> RpcResult<Value>;

    /// Returns the next nonce expected from `address`
    #[method(name = "getTransactionCount")]
    async fn get_transaction_count(&self, address: Address) -> RpcResult<Nonce>;
}
