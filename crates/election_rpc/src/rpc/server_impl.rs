use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use jsonrpsee::{
    core::{async_trait, Error},
    types::error::{CallError, ErrorObject},
};
use parking_lot::Mutex;
use primitives::{
    Address, BlockNumber, CandidateId, ElectionId, Method, Nonce, Receipt, Tally, TxHash,
};
use serde_json::Value;
use telemetry::{debug, warn};

use super::{
    api::{ElectionApiServer, RpcResult},
    CALL_EXECUTION_CODE, INVALID_SIGNATURE_CODE, NONCE_MISMATCH_CODE,
};
use crate::SignedTransaction;

fn rpc_error(code: i32, message: impl Into<String>) -> Error {
    Error::Call(CallError::Custom(ErrorObject::owned(
        code,
        message.into(),
        None::<()>,
    )))
}

#[derive(Debug, Default)]
struct Election {
    tally: Tally,
    voters: HashSet<Address>,
}

#[derive(Debug)]
struct IncludedReceipt {
    receipt: Receipt,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct ContractState {
    elections: HashMap<ElectionId, Election>,
    nonces: HashMap<Address, Nonce>,
    receipts: HashMap<TxHash, IncludedReceipt>,
    block_number: BlockNumber,
    accepted: usize,
}

/// In-memory stand-in for the deployed election contract and the node
/// hosting it. Clones share state.
#[derive(Debug, Clone)]
pub struct DevnetContract {
    address: Address,
    receipt_delay: Duration,
    state: Arc<Mutex<ContractState>>,
}

impl DevnetContract {
    pub fn new(address: Address, receipt_delay: Duration) -> Self {
        Self {
            address,
            receipt_delay,
            state: Arc::new(Mutex::new(ContractState::default())),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of distinct transactions accepted into a block.
    pub fn accepted_transactions(&self) -> usize {
        self.state.lock().accepted
    }

    pub fn tally(&self, election_id: ElectionId) -> Option<Tally> {
        self.state
            .lock()
            .elections
            .get(&election_id)
            .map(|election| election.tally.clone())
    }

    fn election_arg(args: &[Value]) -> Result<ElectionId, String> {
        args.first()
            .and_then(Value::as_u64)
            .map(ElectionId)
            .ok_or_else(|| "electionId must be an unsigned integer".to_string())
    }

    fn candidate_arg(args: &[Value]) -> Result<CandidateId, String> {
        match args.get(1) {
            None => Ok(CandidateId::default()),
            Some(value) => value
                .as_u64()
                .map(CandidateId)
                .ok_or_else(|| "candidateId must be an unsigned integer".to_string()),
        }
    }

    fn execute(
        state: &mut ContractState,
        sender: Address,
        method: Method,
        args: &[Value],
    ) -> Result<(), String> {
        if !method.accepts_arity(args.len()) {
            return Err(format!("wrong number of arguments for {method}"));
        }

        match method {
            Method::StartElection => {
                let election_id = Self::election_arg(args)?;
                if state.elections.contains_key(&election_id) {
                    return Err(format!("election {election_id} already exists"));
                }
                state.elections.insert(election_id, Election::default());
                Ok(())
            },
            Method::Vote => {
                let election_id = Self::election_arg(args)?;
                let candidate_id = Self::candidate_arg(args)?;
                let election = state
                    .elections
                    .get_mut(&election_id)
                    .ok_or_else(|| format!("election {election_id} does not exist"))?;

                if !election.voters.insert(sender) {
                    return Err(format!("{sender} has already voted in election {election_id}"));
                }
                *election.tally.entry(candidate_id).or_default() += 1;
                Ok(())
            },
            Method::GetResult => Err("getResult is a read-only method".to_string()),
        }
    }
}

#[async_trait]
impl ElectionApiServer for DevnetContract {
    async fn send_transaction(&self, txn: SignedTransaction) -> RpcResult<TxHash> {
        let tx_hash = txn
            .hash()
            .map_err(|err| rpc_error(INVALID_SIGNATURE_CODE, err.to_string()))?;

        let mut state = self.state.lock();

        // resubmitting an included transaction is a no-op
        if state.receipts.contains_key(&tx_hash) {
            debug!(%tx_hash, "transaction already included");
            return Ok(tx_hash);
        }

        txn.verify()
            .map_err(|err| rpc_error(INVALID_SIGNATURE_CODE, err.to_string()))?;

        let sender = txn.payload.from;
        let expected = state.nonces.get(&sender).copied().unwrap_or_default();
        if txn.payload.nonce != expected {
            warn!(%sender, expected, got = txn.payload.nonce, "nonce mismatch");
            return Err(rpc_error(
                NONCE_MISMATCH_CODE,
                format!("expected nonce {expected}, got {}", txn.payload.nonce),
            ));
        }

        state.nonces.insert(sender, expected + 1);
        state.block_number += 1;
        state.accepted += 1;

        let outcome = if txn.payload.contract != self.address {
            Err(format!("no contract deployed at {}", txn.payload.contract))
        } else {
            Self::execute(&mut state, sender, txn.payload.method, &txn.payload.args)
        };

        let receipt = Receipt {
            tx_hash: tx_hash.clone(),
            block_number: state.block_number,
            reverted: outcome.is_err(),
            revert_reason: outcome.err(),
        };

        debug!(%tx_hash, method = %txn.payload.method, reverted = receipt.reverted, "transaction included");

        state.receipts.insert(
            tx_hash.clone(),
            IncludedReceipt {
                receipt,
                visible_at: Instant::now() + self.receipt_delay,
            },
        );

        Ok(tx_hash)
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<Receipt>> {
        let state = self.state.lock();

        let receipt = state
            .receipts
            .get(&tx_hash)
            .filter(|included| included.visible_at <= Instant::now())
            .map(|included| included.receipt.clone());

        Ok(receipt)
    }

    async fn call(&self, contract: Address, method: Method, args: Vec<Value>) -> RpcResult<Value> {
        if contract != self.address {
            return Err(rpc_error(
                CALL_EXECUTION_CODE,
                format!("no contract deployed at {contract}"),
            ));
        }

        if !method.is_read_only() {
            return Err(rpc_error(
                CALL_EXECUTION_CODE,
                format!("{method} modifies state and must be sent as a transaction"),
            ));
        }

        let election_id =
            Self::election_arg(&args).map_err(|err| rpc_error(CALL_EXECUTION_CODE, err))?;

        let state = self.state.lock();
        let election = state.elections.get(&election_id).ok_or_else(|| {
            rpc_error(
                CALL_EXECUTION_CODE,
                format!("election {election_id} does not exist"),
            )
        })?;

        serde_json::to_value(&election.tally).map_err(|err| Error::Custom(err.to_string()))
    }

    async fn get_transaction_count(&self, address: Address) -> RpcResult<Nonce> {
        Ok(self
            .state
            .lock()
            .nonces
            .get(&address)
            .copied()
            .unwrap_or_default())
    }
}
