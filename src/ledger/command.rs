//! Reversible units of work executed through the [`TransactionManager`].
//!
//! [`TransactionManager`]: super::manager::TransactionManager

use std::fmt;

use serde::Serialize;

use crate::errors::{LedgerError, Result};

use super::account::{ensure_positive, Account};
use super::book::AccountBook;
use super::transaction::{TransactionId, TransactionRecord};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Deposit => f.write_str("deposit"),
            CommandKind::Withdraw => f.write_str("withdraw"),
            CommandKind::Transfer => f.write_str("transfer"),
        }
    }
}

/// The balance change a command performs.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Deposit { account: String, amount: f64 },
    Withdraw { account: String, amount: f64 },
    Transfer { from: String, to: String, amount: f64 },
}

#[derive(Debug, Clone, PartialEq)]
enum CommandState {
    Pending,
    /// Records produced by execution as `(account id, transaction id)`, in posting order.
    Executed(Vec<(String, TransactionId)>),
    Undone,
}

/// Records posted by one command execution; empty when the call was a no-op.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Receipt {
    pub kind: CommandKind,
    pub records: Vec<TransactionRecord>,
}

impl Receipt {
    /// First posted record; the debit leg for transfers.
    pub fn record(&self) -> Option<&TransactionRecord> {
        self.records.first()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug)]
pub struct Command {
    action: Action,
    description: String,
    state: CommandState,
}

impl Command {
    pub fn deposit(account: impl Into<String>, amount: f64, description: impl Into<String>) -> Self {
        Self::new(
            Action::Deposit {
                account: account.into(),
                amount,
            },
            description,
        )
    }

    pub fn withdraw(account: impl Into<String>, amount: f64, description: impl Into<String>) -> Self {
        Self::new(
            Action::Withdraw {
                account: account.into(),
                amount,
            },
            description,
        )
    }

    pub fn transfer(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            Action::Transfer {
                from: from.into(),
                to: to.into(),
                amount,
            },
            description,
        )
    }

    fn new(action: Action, description: impl Into<String>) -> Self {
        Self {
            action,
            description: description.into(),
            state: CommandState::Pending,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self.action {
            Action::Deposit { .. } => CommandKind::Deposit,
            Action::Withdraw { .. } => CommandKind::Withdraw,
            Action::Transfer { .. } => CommandKind::Transfer,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_executed(&self) -> bool {
        matches!(self.state, CommandState::Executed(_))
    }

    pub fn is_undone(&self) -> bool {
        matches!(self.state, CommandState::Undone)
    }

    /// Transaction ids posted by the execution, empty unless executed.
    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        match &self.state {
            CommandState::Executed(produced) => produced.iter().map(|(_, id)| *id).collect(),
            _ => Vec::new(),
        }
    }

    /// Applies the command once. Later calls return an empty receipt and change nothing.
    pub fn execute(&mut self, book: &mut AccountBook) -> Result<Receipt> {
        let kind = self.kind();
        if !matches!(self.state, CommandState::Pending) {
            return Ok(Receipt {
                kind,
                records: Vec::new(),
            });
        }

        let records = match &self.action {
            Action::Deposit { account, amount } => {
                vec![account_mut(book, account)?.deposit(*amount, &self.description)?]
            }
            Action::Withdraw { account, amount } => {
                vec![account_mut(book, account)?.withdraw(*amount, &self.description)?]
            }
            Action::Transfer { from, to, amount } => {
                let (debit, credit) = transfer(book, from, to, *amount, &self.description)?;
                vec![debit, credit]
            }
        };

        self.state = CommandState::Executed(
            records
                .iter()
                .map(|record| (record.account_id.clone(), record.id))
                .collect(),
        );
        Ok(Receipt { kind, records })
    }

    /// Reverses every posted record, or nothing at all.
    ///
    /// Returns `false` without touching any account when the command is not executed or
    /// when any of its records has already left its account's log.
    pub fn undo(&mut self, book: &mut AccountBook) -> bool {
        let CommandState::Executed(produced) = &self.state else {
            tracing::debug!(kind = %self.kind(), "undo skipped: command not executed");
            return false;
        };

        let intact = produced.iter().all(|(account, id)| {
            book.get(account)
                .is_some_and(|account| account.contains_transaction(*id))
        });
        if !intact {
            tracing::debug!(kind = %self.kind(), "undo skipped: transaction no longer in log");
            return false;
        }

        for (account, id) in produced.iter().rev() {
            if let Some(account) = book.get_mut(account) {
                account.reverse(*id);
            }
        }
        self.state = CommandState::Undone;
        true
    }
}

fn account_mut<'a>(book: &'a mut AccountBook, id: &str) -> Result<&'a mut Account> {
    book.get_mut(id)
        .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
}

/// Moves funds between two accounts with all-or-nothing semantics.
///
/// Every precondition is checked before the source is debited; should the credit leg
/// still fail, the debit is reversed before the error is returned.
fn transfer(
    book: &mut AccountBook,
    from: &str,
    to: &str,
    amount: f64,
    description: &str,
) -> Result<(TransactionRecord, TransactionRecord)> {
    if from == to {
        return Err(LedgerError::SameAccountTransfer(from.to_string()));
    }
    ensure_positive(amount)?;
    if !book.contains(to) {
        return Err(LedgerError::AccountNotFound(to.to_string()));
    }
    book.get(from)
        .ok_or_else(|| LedgerError::AccountNotFound(from.to_string()))?
        .ensure_covers(amount)?;

    let debit = account_mut(book, from)?.withdraw(amount, &leg_description(description, "to", to))?;
    let credit = account_mut(book, to)
        .and_then(|account| account.deposit(amount, &leg_description(description, "from", from)));
    match credit {
        Ok(credit) => Ok((debit, credit)),
        Err(err) => {
            tracing::warn!(%from, %to, error = %err, "credit leg failed, rolling back debit");
            if let Some(source) = book.get_mut(from) {
                source.reverse(debit.id);
            }
            Err(err)
        }
    }
}

fn leg_description(description: &str, direction: &str, counterparty: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        format!("Transfer {direction} {counterparty}")
    } else {
        format!("{description} (transfer {direction} {counterparty})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::MoneyFormat;
    use crate::ledger::{Account, AccountCategory, IdSequence};

    fn book_with(balances: &[(&str, f64)]) -> AccountBook {
        let ids = IdSequence::new();
        let mut book = AccountBook::new();
        for (id, balance) in balances {
            book.insert(
                Account::open(
                    *id,
                    AccountCategory::Checking,
                    *balance,
                    ids.clone(),
                    MoneyFormat::default(),
                )
                .unwrap(),
            );
        }
        book
    }

    fn balance(book: &AccountBook, id: &str) -> f64 {
        book.get(id).unwrap().balance()
    }

    #[test]
    fn deposit_undo_is_left_inverse() {
        let mut book = book_with(&[("ACC-A", 100.0)]);
        let mut command = Command::deposit("ACC-A", 40.0, "gift");

        let receipt = command.execute(&mut book).unwrap();
        assert_eq!(receipt.records.len(), 1);
        assert_eq!(balance(&book, "ACC-A"), 140.0);

        assert!(command.undo(&mut book));
        assert_eq!(balance(&book, "ACC-A"), 100.0);
        assert!(book.get("ACC-A").unwrap().transactions().is_empty());
        assert!(command.is_undone());
    }

    #[test]
    fn repeated_execute_and_undo_are_noops() {
        let mut book = book_with(&[("ACC-A", 100.0)]);
        let mut command = Command::withdraw("ACC-A", 30.0, "groceries");

        command.execute(&mut book).unwrap();
        let again = command.execute(&mut book).unwrap();
        assert!(again.is_empty());
        assert_eq!(balance(&book, "ACC-A"), 70.0);

        assert!(command.undo(&mut book));
        assert!(!command.undo(&mut book));
        assert_eq!(balance(&book, "ACC-A"), 100.0);
    }

    #[test]
    fn undo_before_execute_does_nothing() {
        let mut book = book_with(&[("ACC-A", 100.0)]);
        let mut command = Command::deposit("ACC-A", 10.0, "");
        assert!(!command.undo(&mut book));
        assert_eq!(balance(&book, "ACC-A"), 100.0);
    }

    #[test]
    fn undo_skips_when_record_was_removed_externally() {
        let mut book = book_with(&[("ACC-A", 100.0)]);
        let mut command = Command::deposit("ACC-A", 10.0, "bonus");
        command.execute(&mut book).unwrap();
        let id = command.transaction_ids()[0];
        book.get_mut("ACC-A").unwrap().reverse(id);

        assert!(!command.undo(&mut book));
        assert!(command.is_executed());
        assert_eq!(balance(&book, "ACC-A"), 100.0);
    }

    #[test]
    fn transfer_moves_funds_and_undoes_both_legs() {
        let mut book = book_with(&[("ACC-A", 500.0), ("ACC-B", 0.0)]);
        let mut command = Command::transfer("ACC-A", "ACC-B", 100.0, "rent share");

        let receipt = command.execute(&mut book).unwrap();
        assert_eq!(receipt.kind, CommandKind::Transfer);
        assert_eq!(balance(&book, "ACC-A"), 400.0);
        assert_eq!(balance(&book, "ACC-B"), 100.0);
        assert_eq!(
            receipt.records[1].description,
            "rent share (transfer from ACC-A)"
        );

        assert!(command.undo(&mut book));
        assert_eq!(balance(&book, "ACC-A"), 500.0);
        assert_eq!(balance(&book, "ACC-B"), 0.0);
        assert!(book.get("ACC-A").unwrap().transactions().is_empty());
        assert!(book.get("ACC-B").unwrap().transactions().is_empty());
    }

    #[test]
    fn transfer_with_missing_destination_leaves_source_untouched() {
        let mut book = book_with(&[("ACC-A", 500.0)]);
        let mut command = Command::transfer("ACC-A", "ACC-Z", 100.0, "");

        let err = command.execute(&mut book).unwrap_err();

        assert_eq!(err, LedgerError::AccountNotFound("ACC-Z".into()));
        assert_eq!(balance(&book, "ACC-A"), 500.0);
        assert!(book.get("ACC-A").unwrap().transactions().is_empty());
        assert!(!command.is_executed());
    }

    #[test]
    fn transfer_exceeding_balance_fails_before_any_mutation() {
        let mut book = book_with(&[("ACC-A", 50.0), ("ACC-B", 0.0)]);
        let mut command = Command::transfer("ACC-A", "ACC-B", 80.0, "");

        let err = command.execute(&mut book).unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(balance(&book, "ACC-A"), 50.0);
        assert_eq!(balance(&book, "ACC-B"), 0.0);
    }

    #[test]
    fn transfer_undo_is_all_or_nothing() {
        let mut book = book_with(&[("ACC-A", 500.0), ("ACC-B", 0.0)]);
        let mut command = Command::transfer("ACC-A", "ACC-B", 100.0, "");
        command.execute(&mut book).unwrap();
        let credit = command.transaction_ids()[1];
        book.get_mut("ACC-B").unwrap().reverse(credit);

        assert!(!command.undo(&mut book));
        assert_eq!(balance(&book, "ACC-A"), 400.0);
        assert_eq!(book.get("ACC-A").unwrap().transactions().len(), 1);
    }

    #[test]
    fn self_transfer_is_rejected() {
        let mut book = book_with(&[("ACC-A", 500.0)]);
        let mut command = Command::transfer("ACC-A", "ACC-A", 1.0, "");
        assert_eq!(
            command.execute(&mut book).unwrap_err(),
            LedgerError::SameAccountTransfer("ACC-A".into())
        );
    }
}
