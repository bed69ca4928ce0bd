use std::{sync::Arc, time::Duration};

use election_rpc::ContractBinding;
use primitives::{Method, Receipt, TxHash};
use serde_json::Value;
use telemetry::{debug, info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use wallet::{SessionError, SignerSession, TransactionHandle};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("transaction {tx_hash} reverted")]
    Reverted {
        tx_hash: TxHash,
        reason: Option<String>,
    },

    #[error("no receipt for {tx_hash} yet")]
    Timeout { tx_hash: TxHash },

    #[error("wait cancelled")]
    Cancelled,
}

/// Broadcasts signed invocations and follows them to a receipt.
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    session: Arc<SignerSession>,
    poll_interval: Duration,
}

impl TransactionSubmitter {
    pub fn new(session: Arc<SignerSession>, poll_interval: Duration) -> Self {
        Self {
            session,
            poll_interval,
        }
    }

    pub fn session(&self) -> &Arc<SignerSession> {
        &self.session
    }

    pub fn binding(&self) -> &Arc<dyn ContractBinding> {
        self.session.binding()
    }

    /// One signed broadcast attempt.
    pub async fn submit(
        &self,
        method: Method,
        args: Vec<Value>,
    ) -> Result<Arc<TransactionHandle>, SessionError> {
        self.session
            .sign_and_submit(method, args)
            .await
            .map(Arc::new)
    }

    /// Waits for the receipt of `handle`. A handle that already holds a
    /// receipt answers without touching the network.
    pub async fn await_confirmation(
        &self,
        handle: &TransactionHandle,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Receipt, ConfirmationError> {
        let receipt = match handle.receipt() {
            Some(receipt) => receipt.clone(),
            None => {
                let polled = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ConfirmationError::Cancelled),
                    polled = tokio::time::timeout(timeout, self.poll_receipt(handle.id())) => polled,
                };

                match polled {
                    Ok(receipt) => handle.resolve(receipt).clone(),
                    Err(_) => {
                        info!(tx_hash = %handle.id(), "confirmation wait timed out");
                        return Err(ConfirmationError::Timeout {
                            tx_hash: handle.id().clone(),
                        });
                    },
                }
            },
        };

        if receipt.reverted {
            return Err(ConfirmationError::Reverted {
                tx_hash: receipt.tx_hash,
                reason: receipt.revert_reason,
            });
        }

        Ok(receipt)
    }

    async fn poll_receipt(&self, tx_hash: &TxHash) -> Receipt {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match self.binding().receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    debug!(%tx_hash, block = receipt.block_number, "receipt received");
                    return receipt;
                },
                Ok(None) => {},
                Err(err) => warn!(%tx_hash, "receipt poll failed: {err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use election_rpc::{BindingResult, SignedTransaction};
    use primitives::{generate_mock_account_keypair, Address, Nonce, TxStatus};
    use serde_json::json;
    use wallet::StaticCredentials;

    use super::*;

    /// Returns a receipt after `ready_after` polls.
    #[derive(Debug, Default)]
    struct ReceiptBinding {
        polls: AtomicUsize,
        ready_after: usize,
        reverted: bool,
    }

    #[async_trait]
    impl ContractBinding for ReceiptBinding {
        fn contract_address(&self) -> Address {
            Address([0x12; 20])
        }

        async fn call(&self, _method: Method, _args: Vec<Value>) -> BindingResult<Value> {
            Ok(Value::Null)
        }

        async fn send(&self, txn: SignedTransaction) -> BindingResult<TxHash> {
            Ok(txn.hash().unwrap())
        }

        async fn receipt(&self, tx_hash: &TxHash) -> BindingResult<Option<Receipt>> {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if polls < self.ready_after {
                return Ok(None);
            }

            Ok(Some(Receipt {
                tx_hash: tx_hash.clone(),
                block_number: polls as u64,
                reverted: self.reverted,
                revert_reason: self.reverted.then(|| "already voted".to_string()),
            }))
        }

        async fn transaction_count(&self, _address: &Address) -> BindingResult<Nonce> {
            Ok(0)
        }
    }

    async fn submitter(binding: Arc<ReceiptBinding>) -> TransactionSubmitter {
        let (secret_key, _) = generate_mock_account_keypair(b"submitter");
        let session = SignerSession::connect(binding, &StaticCredentials::new(secret_key))
            .await
            .unwrap();

        TransactionSubmitter::new(Arc::new(session), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn confirmation_is_memoized_on_the_handle() {
        let binding = Arc::new(ReceiptBinding {
            ready_after: 3,
            ..Default::default()
        });
        let submitter = submitter(binding.clone()).await;
        let cancel = CancellationToken::new();

        let handle = submitter
            .submit(Method::StartElection, vec![json!(1)])
            .await
            .unwrap();

        let first = submitter
            .await_confirmation(&handle, Duration::from_secs(5), &cancel)
            .await
            .unwrap();
        let polls = binding.polls.load(Ordering::SeqCst);

        let second = submitter
            .await_confirmation(&handle, Duration::from_secs(5), &cancel)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(polls, 3);
        assert_eq!(binding.polls.load(Ordering::SeqCst), polls);
        assert_eq!(handle.status(), TxStatus::Confirmed);
    }

    #[tokio::test]
    async fn reverted_receipt_carries_the_reason() {
        let binding = Arc::new(ReceiptBinding {
            ready_after: 1,
            reverted: true,
            ..Default::default()
        });
        let submitter = submitter(binding).await;

        let handle = submitter
            .submit(Method::Vote, vec![json!(1)])
            .await
            .unwrap();

        let err = submitter
            .await_confirmation(&handle, Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ConfirmationError::Reverted {
                tx_hash: handle.id().clone(),
                reason: Some("already voted".into()),
            }
        );
        assert_eq!(handle.status(), TxStatus::Failed);
    }

    #[tokio::test]
    async fn timeout_leaves_the_handle_pending() {
        let binding = Arc::new(ReceiptBinding {
            ready_after: usize::MAX,
            ..Default::default()
        });
        let submitter = submitter(binding).await;

        let handle = submitter
            .submit(Method::StartElection, vec![json!(1)])
            .await
            .unwrap();

        let err = submitter
            .await_confirmation(&handle, Duration::from_millis(30), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfirmationError::Timeout { .. }));
        assert_eq!(handle.status(), TxStatus::Pending);
    }

    #[tokio::test]
    async fn cancellation_stops_the_wait() {
        let binding = Arc::new(ReceiptBinding {
            ready_after: usize::MAX,
            ..Default::default()
        });
        let submitter = submitter(binding).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let handle = submitter
            .submit(Method::StartElection, vec![json!(1)])
            .await
            .unwrap();

        let err = submitter
            .await_confirmation(&handle, Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, ConfirmationError::Cancelled);
    }
}
