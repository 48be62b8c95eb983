use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ledger-wide transaction identifier; ordering follows creation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TXN-{:06}", self.0)
    }
}

/// Monotonic id source shared by every account of one ledger.
#[derive(Debug, Clone, Default)]
pub struct IdSequence(Arc<AtomicU64>);

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> TransactionId {
        TransactionId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => f.write_str("deposit"),
            TransactionKind::Withdraw => f.write_str("withdraw"),
        }
    }
}

/// One settled balance change in an account's log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: f64,
    pub balance_after: f64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub account_id: String,
}

impl TransactionRecord {
    /// Amount with its effect on the balance: deposits positive, withdrawals negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Deposit => self.amount,
            TransactionKind::Withdraw => -self.amount,
        }
    }
}
