use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use coordinator::{CoordinatorConfig, CoordinatorConfigBuilder, ElectionCoordinator};
use election_rpc::{
    rpc::{api::ElectionApiServer, DevnetContract, INVALID_SIGNATURE_CODE},
    BindingError, BindingResult, ContractBinding, SignedTransaction,
};
use primitives::{
    generate_mock_account_keypair, Address, ElectionId, Method, Nonce, Receipt, TxHash,
    DEFAULT_CONTRACT_ADDRESS,
};
use serde_json::Value;
use wallet::{SignerSession, StaticCredentials};

/// Talks to a [`DevnetContract`] in-process and lets tests inject faults.
#[derive(Debug)]
pub struct FaultyBinding {
    pub contract: DevnetContract,
    /// Sends to fail as unreachable before the next one goes through.
    pub failing_sends: AtomicUsize,
    /// Reject every send as if the signature was invalid.
    pub reject_sends: AtomicBool,
    /// Report no receipts at all.
    pub hide_receipts: AtomicBool,
    pub send_delay: Duration,
    pub send_calls: AtomicUsize,
}

impl FaultyBinding {
    pub fn new() -> Self {
        Self::with_send_delay(Duration::ZERO)
    }

    pub fn with_send_delay(send_delay: Duration) -> Self {
        let address = DEFAULT_CONTRACT_ADDRESS.parse().unwrap();

        Self {
            contract: DevnetContract::new(address, Duration::ZERO),
            failing_sends: AtomicUsize::new(0),
            reject_sends: AtomicBool::new(false),
            hide_receipts: AtomicBool::new(false),
            send_delay,
            send_calls: AtomicUsize::new(0),
        }
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub async fn chain_nonce(&self, address: Address) -> Nonce {
        self.contract.get_transaction_count(address).await.unwrap()
    }
}

#[async_trait]
impl ContractBinding for FaultyBinding {
    fn contract_address(&self) -> Address {
        self.contract.address()
    }

    async fn call(&self, method: Method, args: Vec<Value>) -> BindingResult<Value> {
        Ok(ElectionApiServer::call(&self.contract, self.contract.address(), method, args).await?)
    }

    async fn send(&self, txn: SignedTransaction) -> BindingResult<TxHash> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);

        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }

        let failing = self.failing_sends.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_sends.store(failing - 1, Ordering::SeqCst);
            return Err(BindingError::Unreachable("connection refused".into()));
        }

        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(BindingError::Rejected {
                code: INVALID_SIGNATURE_CODE,
                message: "signature does not match sender".into(),
            });
        }

        Ok(self.contract.send_transaction(txn).await?)
    }

    async fn receipt(&self, tx_hash: &TxHash) -> BindingResult<Option<Receipt>> {
        if self.hide_receipts.load(Ordering::SeqCst) {
            return Ok(None);
        }

        Ok(self.contract.get_transaction_receipt(tx_hash.clone()).await?)
    }

    async fn transaction_count(&self, address: &Address) -> BindingResult<Nonce> {
        Ok(self.contract.get_transaction_count(*address).await?)
    }
}

pub fn fast_config() -> CoordinatorConfig {
    CoordinatorConfigBuilder::default()
        .max_attempts(3u32)
        .initial_backoff_ms(1u64)
        .max_backoff_ms(4u64)
        .poll_interval_ms(5u64)
        .confirmation_timeout_ms(2_000u64)
        .build()
        .unwrap()
}

pub async fn coordinator_with(
    binding: Arc<FaultyBinding>,
    config: CoordinatorConfig,
) -> ElectionCoordinator {
    let (secret_key, _) = generate_mock_account_keypair(b"coordinator-tests");
    let session = SignerSession::connect(binding, &StaticCredentials::new(secret_key))
        .await
        .unwrap();

    ElectionCoordinator::new(config, Arc::new(session))
}

/// Coordinator over a binding with one election already started.
pub async fn with_election(
    binding: Arc<FaultyBinding>,
    config: CoordinatorConfig,
    election_id: ElectionId,
) -> ElectionCoordinator {
    let coordinator = coordinator_with(binding, config).await;
    coordinator
        .start_election(election_id, &Default::default())
        .await
        .unwrap();

    coordinator
}
