use std::{sync::Arc, time::Duration};

use election_rpc::{BindingError, ContractBinding, RpcContractBinding};
use primitives::{
    Address, ElectionId, ElectionResult, Fingerprint, Method, Tally, TxHash, VoteRequest, VoterKey,
};
use serde_json::{json, Value};
use telemetry::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use wallet::{CredentialSource, SignerSession, TransactionHandle};

use crate::{
    Admission, Backoff, ConfirmationError, CoordinatorConfig, CoordinatorError, IdempotencyGuard,
    Result, Slot, Ticket, TransactionSubmitter,
};

/// Reads the current tally of `election_id`. Needs no signing identity, so
/// any binding will do.
pub async fn query_result(
    binding: &dyn ContractBinding,
    election_id: ElectionId,
) -> Result<ElectionResult> {
    let value = binding
        .call(Method::GetResult, vec![json!(election_id)])
        .await
        .map_err(|err| match err {
            BindingError::Execution(reason) => CoordinatorError::Query(reason),
            other => CoordinatorError::Query(other.to_string()),
        })?;

    let tally: Tally = serde_json::from_value(value).map_err(|err| {
        CoordinatorError::Query(format!("malformed result for election {election_id}: {err}"))
    })?;

    Ok(ElectionResult { election_id, tally })
}

/// Drives election operations from intent to receipt.
///
/// Each write follows `Idle -> Admitting -> Submitting -> Pending ->
/// {Confirmed, Failed}`. The coordinator owns the registry of in-flight
/// operations; share it behind an `Arc` to drive it from several tasks.
#[derive(Debug)]
pub struct ElectionCoordinator {
    config: CoordinatorConfig,
    guard: Arc<IdempotencyGuard>,
    submitter: TransactionSubmitter,
}

impl ElectionCoordinator {
    pub fn new(config: CoordinatorConfig, session: Arc<SignerSession>) -> Self {
        let submitter = TransactionSubmitter::new(session, config.poll_interval());

        Self {
            config,
            guard: Arc::new(IdempotencyGuard::new()),
            submitter,
        }
    }

    /// Connects to the configured endpoint and opens a signer session with
    /// the given credential.
    pub async fn connect(
        config: CoordinatorConfig,
        credentials: &dyn CredentialSource,
    ) -> Result<Self> {
        let binding = RpcContractBinding::new(
            config.rpc_url.clone(),
            config.contract_address,
            config.request_timeout(),
        );

        let session = SignerSession::connect(Arc::new(binding), credentials).await?;

        Ok(Self::new(config, Arc::new(session)))
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn guard(&self) -> &IdempotencyGuard {
        &self.guard
    }

    pub fn address(&self) -> Address {
        self.submitter.session().address()
    }

    /// Voter key of this coordinator's signing identity in `election_id`.
    pub fn voter_key(&self, election_id: ElectionId) -> VoterKey {
        self.submitter.session().voter_key(election_id)
    }

    pub async fn start_election(
        &self,
        election_id: ElectionId,
        cancel: &CancellationToken,
    ) -> Result<TxHash> {
        self.execute(
            Fingerprint::start(election_id),
            Method::StartElection,
            vec![json!(election_id)],
            cancel,
        )
        .await
    }

    pub async fn vote(&self, request: VoteRequest, cancel: &CancellationToken) -> Result<TxHash> {
        let mut args = vec![json!(request.election_id)];
        if let Some(candidate_id) = request.candidate_id {
            args.push(json!(candidate_id));
        }

        self.execute(request.fingerprint(), Method::Vote, args, cancel)
            .await
    }

    /// Reads the current tally. Never cached and never deduplicated.
    pub async fn get_result(&self, election_id: ElectionId) -> Result<ElectionResult> {
        query_result(self.submitter.binding().as_ref(), election_id).await
    }

    /// Waits again for an operation that previously timed out or was
    /// cancelled while pending.
    pub async fn resume(
        &self,
        fingerprint: &Fingerprint,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TxHash> {
        match self.submitted_slot(fingerprint, cancel).await? {
            Some(Slot::Pending { handle, .. }) => {
                self.confirm(fingerprint, &handle, timeout, cancel).await
            },
            Some(Slot::Completed { handle }) => Ok(handle.id().clone()),
            Some(Slot::Submitting { .. }) | None => Err(CoordinatorError::Query(format!(
                "no operation recorded for {fingerprint}"
            ))),
        }
    }

    pub fn status(&self, fingerprint: &Fingerprint) -> Option<Slot> {
        self.guard.slot(fingerprint)
    }

    /// Forgets operations that have been in flight longer than `max_age`.
    pub fn expire_stale(&self, max_age: Duration) -> Vec<Fingerprint> {
        let expired = self.guard.expire(max_age);
        if !expired.is_empty() {
            info!(count = expired.len(), "expired stale operations");
        }

        expired
    }

    async fn execute(
        &self,
        fingerprint: Fingerprint,
        method: Method,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<TxHash> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = Backoff::new(self.config.initial_backoff(), self.config.max_backoff());
        let mut attempt = 0;

        let handle = loop {
            if cancel.is_cancelled() {
                return Err(CoordinatorError::Cancelled);
            }

            attempt += 1;
            debug!(%fingerprint, attempt, "idle -> admitting");
            let ticket = self.admit(&fingerprint, cancel).await?;

            debug!(%fingerprint, attempt, "admitting -> submitting");
            match self
                .submit_attempt(&fingerprint, ticket, method, args.clone(), cancel)
                .await
            {
                Ok(handle) => break handle,
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = backoff.next().unwrap_or_else(|| self.config.max_backoff());
                    warn!(%fingerprint, attempt, ?delay, "submission failed, retrying: {err}");

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(CoordinatorError::Cancelled),
                        _ = tokio::time::sleep(delay) => {},
                    }
                },
                Err(err) => {
                    debug!(%fingerprint, attempt, "submitting -> failed");
                    return Err(err);
                },
            }
        };

        debug!(%fingerprint, tx_hash = %handle.id(), "submitting -> pending");

        self.confirm(
            &fingerprint,
            &handle,
            self.config.confirmation_timeout(),
            cancel,
        )
        .await
    }

    /// Admits `fingerprint` or reports the operation already holding it. A
    /// duplicate that lands while the holder is still submitting waits for
    /// its transaction hash.
    async fn admit(
        &self,
        fingerprint: &Fingerprint,
        cancel: &CancellationToken,
    ) -> Result<Ticket> {
        let slot = match self.guard.admit(fingerprint) {
            Admission::Admitted(ticket) => return Ok(ticket),
            Admission::Rejected(Slot::Submitting { .. }) => {
                debug!(%fingerprint, "duplicate arrived while submitting, waiting for its handle");
                self.submitted_slot(fingerprint, cancel).await?
            },
            Admission::Rejected(slot) => Some(slot),
        };

        let tx_hash = slot.as_ref().and_then(Slot::tx_hash).cloned();
        let status = slot.as_ref().and_then(Slot::status);
        info!(%fingerprint, ?tx_hash, "duplicate submission refused");

        Err(CoordinatorError::DuplicateSubmission {
            fingerprint: fingerprint.clone(),
            tx_hash,
            status,
        })
    }

    /// Current slot of `fingerprint` once no submission for it is in progress.
    async fn submitted_slot(
        &self,
        fingerprint: &Fingerprint,
        cancel: &CancellationToken,
    ) -> Result<Option<Slot>> {
        loop {
            let mut submitted = match self.guard.slot(fingerprint) {
                Some(Slot::Submitting { submitted, .. }) => submitted,
                slot => return Ok(slot),
            };

            // the sender is dropped, never written, once the submission settles
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CoordinatorError::Cancelled),
                _ = submitted.changed() => {},
            }
        }
    }

    /// Runs one submission in its own task so that the outcome is recorded in
    /// the registry even when the caller stops waiting for it.
    async fn submit_attempt(
        &self,
        fingerprint: &Fingerprint,
        ticket: Ticket,
        method: Method,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<Arc<TransactionHandle>> {
        let submitter = self.submitter.clone();
        let guard = self.guard.clone();
        let owned = fingerprint.clone();

        let attempt = tokio::spawn(async move {
            let outcome = submitter.submit(method, args).await;

            let recorded = match &outcome {
                Ok(handle) => guard.attach(&owned, ticket, handle.clone()),
                Err(_) => guard.abandon(&owned, ticket),
            };

            if let Err(err) = recorded {
                error!(fingerprint = %owned, "unable to record submission outcome: {err}");
            }

            outcome
        });

        tokio::select! {
            biased;
            joined = attempt => match joined {
                Ok(outcome) => outcome.map_err(CoordinatorError::from),
                Err(err) => Err(CoordinatorError::Network(format!("submission task failed: {err}"))),
            },
            _ = cancel.cancelled() => {
                debug!(%fingerprint, "cancelled while submitting, attempt continues in the background");
                Err(CoordinatorError::Cancelled)
            },
        }
    }

    async fn confirm(
        &self,
        fingerprint: &Fingerprint,
        handle: &TransactionHandle,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TxHash> {
        match self
            .submitter
            .await_confirmation(handle, timeout, cancel)
            .await
        {
            Ok(receipt) => {
                debug!(%fingerprint, tx_hash = %receipt.tx_hash, "pending -> confirmed");
                self.settle(fingerprint);
                Ok(receipt.tx_hash)
            },
            Err(err @ ConfirmationError::Reverted { .. }) => {
                debug!(%fingerprint, tx_hash = %handle.id(), "pending -> failed");
                self.settle(fingerprint);
                Err(err.into())
            },
            Err(err) => {
                debug!(%fingerprint, tx_hash = %handle.id(), "still pending: {err}");
                Err(err.into())
            },
        }
    }

    fn settle(&self, fingerprint: &Fingerprint) {
        // a concurrent resume may have settled the fingerprint already
        if let Err(err) = self.guard.release(fingerprint) {
            warn!(%fingerprint, "unable to release: {err}");
        }
    }
}
