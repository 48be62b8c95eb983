use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::Result;

use super::account::AccountSnapshot;
use super::command::Receipt;
use super::ledger::Ledger;

/// Cloneable handle that serializes every ledger call behind one mutex.
///
/// Balance and log updates are not atomic on their own, so multi-threaded hosts must go
/// through a single writer; this is that writer.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Runs `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn deposit(&self, account_id: &str, amount: f64, description: &str) -> Result<Receipt> {
        self.lock().deposit(account_id, amount, description)
    }

    pub fn withdraw(&self, account_id: &str, amount: f64, description: &str) -> Result<Receipt> {
        self.lock().withdraw(account_id, amount, description)
    }

    pub fn transfer(&self, from_id: &str, to_id: &str, amount: f64, description: &str) -> Result<Receipt> {
        self.lock().transfer(from_id, to_id, amount, description)
    }

    pub fn undo(&self) -> bool {
        self.lock().undo()
    }

    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        self.lock().accounts()
    }

    // Ledger operations never panic midway through a mutation, so a poisoned lock still
    // guards a consistent ledger.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}
