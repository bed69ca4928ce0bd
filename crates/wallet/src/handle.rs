use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use primitives::{Method, Receipt, TxHash, TxStatus};

/// A transaction accepted by the network. Pending until a receipt is
/// recorded; the first recorded receipt is final.
#[derive(Debug)]
pub struct TransactionHandle {
    id: TxHash,
    method: Method,
    submitted_at: DateTime<Utc>,
    receipt: OnceCell<Receipt>,
}

impl TransactionHandle {
    pub fn new(id: TxHash, method: Method) -> Self {
        Self {
            id,
            method,
            submitted_at: Utc::now(),
            receipt: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &TxHash {
        &self.id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn status(&self) -> TxStatus {
        self.receipt
            .get()
            .map(Receipt::status)
            .unwrap_or(TxStatus::Pending)
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.get()
    }

    /// Records the terminal receipt and returns whichever receipt won, so
    /// concurrent observers all see the same one.
    pub fn resolve(&self, receipt: Receipt) -> &Receipt {
        match self.receipt.try_insert(receipt) {
            Ok(stored) => stored,
            Err((existing, _)) => existing,
        }
    }
}
