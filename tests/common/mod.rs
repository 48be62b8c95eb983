#![allow(dead_code)]

use std::sync::Arc;

use bank_ledger::ledger::{AccountCategory, Customer, Ledger, RecordingSink};

/// Ledger with one registered customer whose notifications are recorded.
pub fn ledger_with_watcher() -> (Ledger, Arc<RecordingSink>) {
    bank_ledger::init();
    let sink = RecordingSink::new();
    let mut ledger = Ledger::new();
    ledger.register_customer(
        Customer::new("watcher", "Watcher").with_email("watcher@example.com"),
        sink.clone(),
    );
    (ledger, sink)
}

/// Opens an account subscribed to the watcher and returns its id.
pub fn open(ledger: &mut Ledger, category: AccountCategory, balance: f64) -> String {
    ledger
        .open_account(category, balance, Some("watcher"))
        .expect("open account")
        .id
}

pub fn balance(ledger: &Ledger, id: &str) -> f64 {
    ledger.account(id).expect("account exists").balance()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
