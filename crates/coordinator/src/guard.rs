use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::{mapref::entry::Entry, DashMap};
use primitives::{Fingerprint, TxHash, TxStatus};
use telemetry::debug;
use thiserror::Error;
use tokio::sync::watch;
use wallet::TransactionHandle;

/// Identifies the operation that admitted a fingerprint.
pub type Ticket = u64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("{0} was never admitted")]
    NotAdmitted(Fingerprint),

    #[error("{fingerprint} is still pending as {tx_hash}")]
    StillPending {
        fingerprint: Fingerprint,
        tx_hash: TxHash,
    },

    #[error("{0} has not reached the network yet")]
    StillSubmitting(Fingerprint),

    #[error("ticket {ticket} does not own {fingerprint}")]
    NotOwner {
        fingerprint: Fingerprint,
        ticket: Ticket,
    },
}

/// Registry entry for one fingerprint.
#[derive(Debug, Clone)]
pub enum Slot {
    /// Admitted, submission in progress, no transaction hash yet.
    /// `submitted` closes once the admitting ticket attaches or abandons.
    Submitting {
        ticket: Ticket,
        admitted_at: Instant,
        submitted: watch::Receiver<()>,
    },
    /// Accepted by the network, awaiting its receipt.
    Pending {
        ticket: Ticket,
        admitted_at: Instant,
        handle: Arc<TransactionHandle>,
    },
    /// Confirmed. Kept for the life of the process so the request is never
    /// submitted again.
    Completed { handle: Arc<TransactionHandle> },
}

impl Slot {
    pub fn handle(&self) -> Option<&Arc<TransactionHandle>> {
        match self {
            Slot::Submitting { .. } => None,
            Slot::Pending { handle, .. } | Slot::Completed { handle } => Some(handle),
        }
    }

    pub fn tx_hash(&self) -> Option<&TxHash> {
        self.handle().map(|handle| handle.id())
    }

    /// `None` while submitting.
    pub fn status(&self) -> Option<TxStatus> {
        self.handle().map(|handle| handle.status())
    }

    fn is_in_flight(&self) -> bool {
        !matches!(self, Slot::Completed { .. })
    }

    fn admitted_before(&self, cutoff: Instant) -> bool {
        match self {
            Slot::Submitting { admitted_at, .. } | Slot::Pending { admitted_at, .. } => {
                *admitted_at < cutoff
            },
            Slot::Completed { .. } => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Admission {
    Admitted(Ticket),
    Rejected(Slot),
}

/// Client-side duplicate suppression keyed by request fingerprint.
///
/// Every mutation goes through a single map entry, so a check and the update
/// that follows it are one atomic step even under concurrent callers. This does
/// not stop another client instance from repeating a request; the contract has
/// to enforce that.
///
/// Confirmed fingerprints are never evicted, not even by [`expire`], so the
/// registry grows by one entry per confirmed operation for the life of the
/// process.
///
/// [`expire`]: IdempotencyGuard::expire
#[derive(Debug, Default)]
pub struct IdempotencyGuard {
    slots: DashMap<Fingerprint, Slot>,
    /// Held per `Submitting` ticket and dropped once it settles.
    submissions: DashMap<Ticket, watch::Sender<()>>,
    next_ticket: AtomicU64,
}

impl IdempotencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self, fingerprint: &Fingerprint) -> Admission {
        match self.slots.entry(fingerprint.clone()) {
            Entry::Occupied(entry) => {
                debug!(%fingerprint, "admission rejected");
                Admission::Rejected(entry.get().clone())
            },
            Entry::Vacant(entry) => {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                let (tx, submitted) = watch::channel(());
                self.submissions.insert(ticket, tx);
                entry.insert(Slot::Submitting {
                    ticket,
                    admitted_at: Instant::now(),
                    submitted,
                });
                debug!(%fingerprint, ticket, "admitted");
                Admission::Admitted(ticket)
            },
        }
    }

    /// Records the handle of the submission made under `ticket`.
    pub fn attach(
        &self,
        fingerprint: &Fingerprint,
        ticket: Ticket,
        handle: Arc<TransactionHandle>,
    ) -> Result<(), GuardError> {
        let Entry::Occupied(mut entry) = self.slots.entry(fingerprint.clone()) else {
            return Err(GuardError::NotAdmitted(fingerprint.clone()));
        };

        let admitted_at = match entry.get() {
            Slot::Submitting {
                ticket: owner,
                admitted_at,
                ..
            } if *owner == ticket => *admitted_at,
            _ => {
                return Err(GuardError::NotOwner {
                    fingerprint: fingerprint.clone(),
                    ticket,
                })
            },
        };

        entry.insert(Slot::Pending {
            ticket,
            admitted_at,
            handle,
        });
        drop(entry);
        self.submissions.remove(&ticket);

        Ok(())
    }

    /// Drops an admission whose submission never reached the network.
    pub fn abandon(&self, fingerprint: &Fingerprint, ticket: Ticket) -> Result<(), GuardError> {
        let removed = self.slots.remove_if(fingerprint, |_, slot| {
            matches!(slot, Slot::Submitting { ticket: owner, .. } if *owner == ticket)
        });

        match removed {
            Some(_) => {
                self.submissions.remove(&ticket);
                debug!(%fingerprint, ticket, "admission abandoned");
                Ok(())
            },
            None => Err(GuardError::NotOwner {
                fingerprint: fingerprint.clone(),
                ticket,
            }),
        }
    }

    /// Settles a fingerprint whose transaction reached a terminal status.
    /// Confirmed requests stay on record; failed ones are forgotten so the
    /// request can be made again.
    pub fn release(&self, fingerprint: &Fingerprint) -> Result<(), GuardError> {
        match self.slots.entry(fingerprint.clone()) {
            Entry::Vacant(_) => Err(GuardError::NotAdmitted(fingerprint.clone())),
            Entry::Occupied(mut entry) => match entry.get().clone() {
                Slot::Submitting { .. } => Err(GuardError::StillSubmitting(fingerprint.clone())),
                Slot::Completed { .. } => Ok(()),
                Slot::Pending { handle, .. } => match handle.status() {
                    TxStatus::Pending => Err(GuardError::StillPending {
                        fingerprint: fingerprint.clone(),
                        tx_hash: handle.id().clone(),
                    }),
                    TxStatus::Confirmed => {
                        entry.insert(Slot::Completed { handle });
                        Ok(())
                    },
                    TxStatus::Failed => {
                        entry.remove();
                        Ok(())
                    },
                },
            },
        }
    }

    /// Removes in-flight entries admitted more than `max_age` ago and returns
    /// their fingerprints. Confirmed entries never expire.
    pub fn expire(&self, max_age: Duration) -> Vec<Fingerprint> {
        let Some(cutoff) = Instant::now().checked_sub(max_age) else {
            return Vec::new();
        };

        let candidates: Vec<Fingerprint> = self
            .slots
            .iter()
            .filter(|entry| entry.value().admitted_before(cutoff))
            .map(|entry| entry.key().clone())
            .collect();

        candidates
            .into_iter()
            .filter_map(|fingerprint| {
                let (fingerprint, slot) = self
                    .slots
                    .remove_if(&fingerprint, |_, slot| slot.admitted_before(cutoff))?;
                if let Slot::Submitting { ticket, .. } = slot {
                    self.submissions.remove(&ticket);
                }
                Some(fingerprint)
            })
            .inspect(|fingerprint| debug!(%fingerprint, "expired"))
            .collect()
    }

    pub fn slot(&self, fingerprint: &Fingerprint) -> Option<Slot> {
        self.slots.get(fingerprint).map(|slot| slot.value().clone())
    }

    /// Number of admitted requests that have not settled.
    pub fn in_flight(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().is_in_flight())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use primitives::{ElectionId, Method, Receipt, VoterKey};

    use super::*;

    fn fingerprint() -> Fingerprint {
        Fingerprint::vote(ElectionId(1), &VoterKey::new("A"))
    }

    fn admitted(guard: &IdempotencyGuard, fingerprint: &Fingerprint) -> Ticket {
        match guard.admit(fingerprint) {
            Admission::Admitted(ticket) => ticket,
            Admission::Rejected(slot) => panic!("unexpected rejection: {slot:?}"),
        }
    }

    fn pending(guard: &IdempotencyGuard, fingerprint: &Fingerprint) -> Arc<TransactionHandle> {
        let ticket = admitted(guard, fingerprint);
        let handle = Arc::new(TransactionHandle::new(TxHash::new("0xfeed"), Method::Vote));
        guard.attach(fingerprint, ticket, handle.clone()).unwrap();
        handle
    }

    fn settle(handle: &TransactionHandle, reverted: bool) {
        handle.resolve(Receipt {
            tx_hash: handle.id().clone(),
            block_number: 1,
            reverted,
            revert_reason: None,
        });
    }

    #[test]
    fn second_admission_is_rejected_with_the_existing_slot() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        let handle = pending(&guard, &fp);

        match guard.admit(&fp) {
            Admission::Rejected(slot) => {
                assert_eq!(slot.tx_hash(), Some(handle.id()));
                assert_eq!(slot.status(), Some(TxStatus::Pending));
            },
            Admission::Admitted(_) => panic!("duplicate admitted"),
        }
    }

    #[test]
    fn releasing_a_pending_fingerprint_is_reported() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        pending(&guard, &fp);

        assert!(matches!(
            guard.release(&fp),
            Err(GuardError::StillPending { .. })
        ));
        assert_eq!(guard.in_flight(), 1);
    }

    #[test]
    fn releasing_unknown_or_submitting_fingerprints_is_reported() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        assert_eq!(guard.release(&fp), Err(GuardError::NotAdmitted(fp.clone())));

        admitted(&guard, &fp);
        assert_eq!(guard.release(&fp), Err(GuardError::StillSubmitting(fp.clone())));
    }

    #[test]
    fn confirmed_requests_are_never_admitted_again() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        let handle = pending(&guard, &fp);
        settle(&handle, false);
        guard.release(&fp).unwrap();

        assert_eq!(guard.in_flight(), 0);
        assert!(matches!(
            guard.admit(&fp),
            Admission::Rejected(Slot::Completed { .. })
        ));
    }

    #[test]
    fn failed_requests_can_be_made_again() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        let handle = pending(&guard, &fp);
        settle(&handle, true);
        guard.release(&fp).unwrap();

        assert!(guard.slot(&fp).is_none());
        admitted(&guard, &fp);
    }

    #[test]
    fn only_the_owning_ticket_can_abandon_or_attach() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        let ticket = admitted(&guard, &fp);
        let handle = Arc::new(TransactionHandle::new(TxHash::new("0x1"), Method::Vote));

        assert!(guard.abandon(&fp, ticket + 1).is_err());
        assert!(guard.attach(&fp, ticket + 1, handle).is_err());

        guard.abandon(&fp, ticket).unwrap();
        assert!(guard.slot(&fp).is_none());
    }

    #[tokio::test]
    async fn rejected_callers_are_notified_when_the_submission_settles() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        let ticket = admitted(&guard, &fp);
        let mut submitted = match guard.admit(&fp) {
            Admission::Rejected(Slot::Submitting { submitted, .. }) => submitted,
            other => panic!("expected a submitting slot, got {other:?}"),
        };

        let handle = Arc::new(TransactionHandle::new(TxHash::new("0xbeef"), Method::Vote));
        guard.attach(&fp, ticket, handle.clone()).unwrap();

        assert!(submitted.changed().await.is_err());
        assert_eq!(guard.slot(&fp).unwrap().tx_hash(), Some(handle.id()));
    }

    #[tokio::test]
    async fn abandoning_also_notifies_rejected_callers() {
        let guard = IdempotencyGuard::new();
        let fp = fingerprint();

        let ticket = admitted(&guard, &fp);
        let mut submitted = match guard.admit(&fp) {
            Admission::Rejected(Slot::Submitting { submitted, .. }) => submitted,
            other => panic!("expected a submitting slot, got {other:?}"),
        };

        guard.abandon(&fp, ticket).unwrap();

        assert!(submitted.changed().await.is_err());
        assert!(guard.slot(&fp).is_none());
    }

    #[test]
    fn expiry_removes_stale_in_flight_entries() {
        let guard = IdempotencyGuard::new();
        let stale = fingerprint();
        let done = Fingerprint::start(ElectionId(1));

        pending(&guard, &stale);
        let handle = pending(&guard, &done);
        settle(&handle, false);
        guard.release(&done).unwrap();

        thread::sleep(Duration::from_millis(20));

        assert!(guard.expire(Duration::from_secs(60)).is_empty());
        assert_eq!(guard.expire(Duration::from_millis(10)), vec![stale.clone()]);
        assert!(guard.slot(&stale).is_none());
        assert!(guard.slot(&done).is_some());
    }

    #[test]
    fn concurrent_admissions_admit_exactly_one() {
        let guard = Arc::new(IdempotencyGuard::new());
        let barrier = Arc::new(Barrier::new(16));

        let admitted = (0..16)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    matches!(guard.admit(&fingerprint()), Admission::Admitted(_))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, 1);
    }
}
