#![doc(test(attr(deny(warnings))))]

//! In-memory bank ledger with reversible deposits, withdrawals and transfers.
//!
//! Every balance change runs as a [`ledger::Command`] on a linear undo stack, so the
//! most recent operations can be reversed one at a time:
//!
//! ```
//! use bank_ledger::ledger::{AccountCategory, Ledger};
//!
//! let mut ledger = Ledger::new();
//! let account = ledger.open_account(AccountCategory::Savings, 5000.0, None).unwrap();
//! ledger.deposit(&account.id, 200.0, "salary").unwrap();
//! assert_eq!(ledger.account(&account.id).unwrap().balance(), 5200.0);
//!
//! assert!(ledger.undo());
//! assert_eq!(ledger.account(&account.id).unwrap().balance(), 5000.0);
//! ```

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod utils;

pub use errors::{LedgerError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("bank_ledger tracing initialized");
    });
}
