use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result};

use super::account::{Account, AccountSnapshot};
use super::book::AccountBook;
use super::command::{Command, Receipt};
use super::interest::AccountCategory;
use super::manager::TransactionManager;
use super::notify::{NotificationSink, Severity};
use super::transaction::{IdSequence, TransactionRecord};

/// A named subscriber that can be attached to accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

struct CustomerEntry {
    customer: Customer,
    sink: Arc<dyn NotificationSink>,
}

impl fmt::Debug for CustomerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.customer, f)
    }
}

/// Owns the accounts, the customer registry and the undo stack.
///
/// Every balance change goes through a [`Command`] executed by the
/// [`TransactionManager`], so each one can be undone in LIFO order.
#[derive(Debug)]
pub struct Ledger {
    id: Uuid,
    created_at: DateTime<Utc>,
    config: LedgerConfig,
    accounts: AccountBook,
    customers: Vec<CustomerEntry>,
    manager: TransactionManager,
    ids: IdSequence,
    /// `None` once the numbering has run past `u64::MAX`.
    next_account_number: Option<u64>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let next_account_number = Some(config.first_account_number);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            config,
            accounts: AccountBook::new(),
            customers: Vec::new(),
            manager: TransactionManager::new(),
            ids: IdSequence::new(),
            next_account_number,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Registers a customer; returns `false` if the id is already taken.
    pub fn register_customer(&mut self, customer: Customer, sink: Arc<dyn NotificationSink>) -> bool {
        if self.customer(&customer.id).is_some() {
            return false;
        }
        tracing::info!(ledger = %self.id, customer = %customer.id, "customer registered");
        self.customers.push(CustomerEntry { customer, sink });
        true
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customer_entry(id).map(|entry| &entry.customer)
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().map(|entry| &entry.customer)
    }

    /// Opens an account and subscribes `subscriber_id` to it when that customer exists.
    pub fn open_account(
        &mut self,
        category: AccountCategory,
        initial_balance: f64,
        subscriber_id: Option<&str>,
    ) -> Result<AccountSnapshot> {
        let (id, number) = self
            .fresh_account_id()
            .inspect_err(|err| log_rejection("open_account", err))?;
        let mut account = Account::open(
            id,
            category,
            initial_balance,
            self.ids.clone(),
            self.config.money_format(),
        )
        .inspect_err(|err| log_rejection("open_account", err))?;

        match subscriber_id.and_then(|id| self.customer_entry(id)) {
            Some(entry) => account.subscribe(entry.customer.id.clone(), Arc::clone(&entry.sink)),
            None => {
                if let Some(unknown) = subscriber_id {
                    tracing::debug!(customer = %unknown, "subscriber not registered, skipping");
                }
            }
        }
        self.next_account_number = number.checked_add(1);

        account.announce(
            &format!(
                "Opened {} account {} with balance {}",
                category,
                account.id(),
                self.config.money_format().format(initial_balance)
            ),
            Severity::Info,
        );
        tracing::info!(
            ledger = %self.id,
            account = %account.id(),
            %category,
            initial_balance,
            "account opened"
        );
        Ok(self.accounts.insert(account).snapshot())
    }

    /// Subscribes a registered customer to an account.
    ///
    /// Returns `Ok(false)` when the customer is unknown.
    pub fn subscribe(&mut self, account_id: &str, customer_id: &str) -> Result<bool> {
        let sink = self.customer_entry(customer_id).map(|entry| Arc::clone(&entry.sink));
        let account = self.account_mut(account_id)?;
        match sink {
            Some(sink) => {
                account.subscribe(customer_id, sink);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn unsubscribe(&mut self, account_id: &str, customer_id: &str) -> Result<()> {
        self.account_mut(account_id)?.unsubscribe(customer_id);
        Ok(())
    }

    pub fn deposit(&mut self, account_id: &str, amount: f64, description: &str) -> Result<Receipt> {
        self.ensure_account(account_id)?;
        self.execute(Command::deposit(account_id, amount, description))
    }

    pub fn withdraw(&mut self, account_id: &str, amount: f64, description: &str) -> Result<Receipt> {
        self.ensure_account(account_id)?;
        self.execute(Command::withdraw(account_id, amount, description))
    }

    pub fn transfer(
        &mut self,
        from_id: &str,
        to_id: &str,
        amount: f64,
        description: &str,
    ) -> Result<Receipt> {
        self.ensure_account(from_id)?;
        self.ensure_account(to_id)?;
        if from_id == to_id {
            let err = LedgerError::SameAccountTransfer(from_id.to_string());
            log_rejection("transfer", &err);
            return Err(err);
        }
        self.execute(Command::transfer(from_id, to_id, amount, description))
    }

    /// Undoes the most recent command still on the stack.
    pub fn undo(&mut self) -> bool {
        let undone = self.manager.undo_last(&mut self.accounts);
        if undone {
            tracing::info!(ledger = %self.id, remaining = self.manager.len(), "undo applied");
        }
        undone
    }

    pub fn can_undo(&self) -> bool {
        self.manager.can_undo()
    }

    pub fn history(&self) -> &[Command] {
        self.manager.history()
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        self.accounts.iter().map(Account::snapshot).collect()
    }

    /// Every retained record, newest first; equal timestamps keep posting order reversed.
    pub fn all_transactions(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .accounts
            .iter()
            .flat_map(|account| account.transactions().iter().cloned())
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        records
    }

    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionRecord> {
        let mut records = self.all_transactions();
        records.truncate(limit);
        records
    }

    /// Sum of balances per category, for categories that have at least one account.
    pub fn balances_by_category(&self) -> BTreeMap<AccountCategory, f64> {
        let mut totals = BTreeMap::new();
        for account in self.accounts.iter() {
            *totals.entry(account.category()).or_insert(0.0) += account.balance();
        }
        totals
    }

    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(Account::balance).sum()
    }

    pub fn interest_due(&self, account_id: &str, years: f64) -> Result<f64> {
        self.accounts
            .get(account_id)
            .map(|account| account.interest_due(years))
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    fn execute(&mut self, command: Command) -> Result<Receipt> {
        let kind = command.kind();
        match self.manager.execute_command(command, &mut self.accounts) {
            Ok(receipt) => {
                tracing::info!(
                    ledger = %self.id,
                    %kind,
                    records = receipt.records.len(),
                    "command executed"
                );
                Ok(receipt)
            }
            Err(err) => {
                log_rejection(&kind.to_string(), &err);
                Err(err)
            }
        }
    }

    fn ensure_account(&self, id: &str) -> Result<()> {
        if self.accounts.contains(id) {
            Ok(())
        } else {
            let err = LedgerError::AccountNotFound(id.to_string());
            log_rejection("lookup", &err);
            Err(err)
        }
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    fn customer_entry(&self, id: &str) -> Option<&CustomerEntry> {
        self.customers.iter().find(|entry| entry.customer.id == id)
    }

    /// First free `{prefix}-{n}` id at or after the next account number.
    fn fresh_account_id(&self) -> Result<(String, u64)> {
        let exhausted = || LedgerError::AccountNumbersExhausted(self.config.account_prefix.clone());
        let mut number = self.next_account_number.ok_or_else(exhausted)?;
        loop {
            let candidate = format!("{}-{}", self.config.account_prefix, number);
            if !self.accounts.contains(&candidate) {
                return Ok((candidate, number));
            }
            number = number.checked_add(1).ok_or_else(exhausted)?;
        }
    }
}

fn log_rejection(operation: &str, err: &LedgerError) {
    tracing::warn!(operation, kind = err.kind(), error = %err, "operation rejected");
}
