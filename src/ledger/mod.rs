//! Accounts, reversible commands and the ledger that ties them together.

pub mod account;
pub mod book;
pub mod command;
pub mod interest;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod manager;
pub mod notify;
pub mod shared;
pub mod transaction;

pub use account::{Account, AccountSnapshot};
pub use book::AccountBook;
pub use command::{Command, CommandKind, Receipt};
pub use interest::{AccountCategory, InterestPolicy};
pub use ledger::{Customer, Ledger};
pub use manager::TransactionManager;
pub use notify::{Notification, NotificationSink, RecordingSink, Severity, Subscribers};
pub use shared::SharedLedger;
pub use transaction::{IdSequence, TransactionId, TransactionKind, TransactionRecord};
