use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::MoneyFormat;
use crate::errors::{LedgerError, Result};

use super::interest::{AccountCategory, InterestPolicy};
use super::notify::{NotificationSink, Severity, Subscribers};
use super::transaction::{IdSequence, TransactionId, TransactionKind, TransactionRecord};

/// A balance plus its append-only log of settled transactions.
///
/// The balance only moves through [`Account::deposit`], [`Account::withdraw`] and the
/// crate-internal reversal used by undo, so it always equals the opening balance plus
/// the signed sum of the retained records.
#[derive(Debug, Clone)]
pub struct Account {
    id: String,
    category: AccountCategory,
    policy: InterestPolicy,
    opening_balance: f64,
    balance: f64,
    created_at: DateTime<Utc>,
    log: Vec<TransactionRecord>,
    subscribers: Subscribers,
    ids: IdSequence,
    money: MoneyFormat,
}

/// Read-only view handed to presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub id: String,
    pub category: AccountCategory,
    pub balance: f64,
    pub rate: f64,
    pub transaction_count: usize,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Opens an account; the opening balance must be a finite, non-negative amount.
    pub fn open(
        id: impl Into<String>,
        category: AccountCategory,
        opening_balance: f64,
        ids: IdSequence,
        money: MoneyFormat,
    ) -> Result<Self> {
        if !opening_balance.is_finite() || opening_balance < 0.0 {
            return Err(LedgerError::InvalidAmount(opening_balance));
        }
        Ok(Self {
            id: id.into(),
            category,
            policy: category.policy(),
            opening_balance,
            balance: opening_balance,
            created_at: Utc::now(),
            log: Vec::new(),
            subscribers: Subscribers::default(),
            ids,
            money,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> AccountCategory {
        self.category
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn opening_balance(&self) -> f64 {
        self.opening_balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.log
    }

    pub fn contains_transaction(&self, id: TransactionId) -> bool {
        self.log.iter().any(|record| record.id == id)
    }

    pub fn deposit(&mut self, amount: f64, description: &str) -> Result<TransactionRecord> {
        ensure_positive(amount)?;
        self.balance += amount;
        let record = self.append(TransactionKind::Deposit, amount, description);
        self.subscribers.broadcast(
            &format!(
                "Deposited {} to {}. New balance: {}",
                self.money.format(amount),
                self.id,
                self.money.format(self.balance)
            ),
            Severity::Success,
        );
        Ok(record)
    }

    pub fn withdraw(&mut self, amount: f64, description: &str) -> Result<TransactionRecord> {
        ensure_positive(amount)?;
        self.ensure_covers(amount)?;
        self.balance -= amount;
        let record = self.append(TransactionKind::Withdraw, amount, description);
        self.subscribers.broadcast(
            &format!(
                "Withdrew {} from {}. New balance: {}",
                self.money.format(amount),
                self.id,
                self.money.format(self.balance)
            ),
            Severity::Success,
        );
        Ok(record)
    }

    /// Fails with `InsufficientFunds` unless the balance covers `amount`.
    pub fn ensure_covers(&self, amount: f64) -> Result<()> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Removes the record and undoes its balance effect without validation.
    ///
    /// Returns `None` and leaves the account untouched when the record is no longer
    /// in the log.
    pub(crate) fn reverse(&mut self, id: TransactionId) -> Option<TransactionRecord> {
        let position = self.log.iter().position(|record| record.id == id)?;
        let record = self.log.remove(position);
        // Replays the retained log so the balance matches the forward path bit for bit.
        self.balance = self
            .log
            .iter()
            .fold(self.opening_balance, |balance, kept| balance + kept.signed_amount());
        self.subscribers.broadcast(
            &format!(
                "Reversed {} of {} on {}. New balance: {}",
                record.kind,
                self.money.format(record.amount),
                self.id,
                self.money.format(self.balance)
            ),
            Severity::Warning,
        );
        Some(record)
    }

    pub fn subscribe(&mut self, subscriber_id: impl Into<String>, sink: Arc<dyn NotificationSink>) {
        self.subscribers.subscribe(subscriber_id, sink);
    }

    pub fn unsubscribe(&mut self, subscriber_id: &str) {
        self.subscribers.unsubscribe(subscriber_id);
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    /// Sends an out-of-band event to this account's subscribers.
    pub fn announce(&self, message: &str, severity: Severity) {
        self.subscribers.broadcast(message, severity);
    }

    pub fn interest_rate(&self) -> f64 {
        self.policy.rate()
    }

    pub fn interest_due(&self, years: f64) -> f64 {
        self.policy.interest(self.balance, years)
    }

    pub fn interest_due_annual(&self) -> f64 {
        self.interest_due(1.0)
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id.clone(),
            category: self.category,
            balance: self.balance,
            rate: self.interest_rate(),
            transaction_count: self.log.len(),
            created_at: self.created_at,
        }
    }

    fn append(&mut self, kind: TransactionKind, amount: f64, description: &str) -> TransactionRecord {
        let record = TransactionRecord {
            id: self.ids.next_id(),
            kind,
            amount,
            balance_after: self.balance,
            description: description.to_string(),
            timestamp: Utc::now(),
            account_id: self.id.clone(),
        };
        self.log.push(record.clone());
        record
    }
}

pub(crate) fn ensure_positive(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}
