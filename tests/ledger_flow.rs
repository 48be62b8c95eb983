mod common;

use bank_ledger::ledger::{AccountCategory, Severity, TransactionKind};
use bank_ledger::LedgerError;
use common::{assert_close, balance, ledger_with_watcher, open};

#[test]
fn salary_deposit_then_overdraft_attempt() {
    let (mut ledger, _) = ledger_with_watcher();
    let id = open(&mut ledger, AccountCategory::Savings, 5000.0);

    ledger.deposit(&id, 200.0, "salary").unwrap();
    assert_eq!(balance(&ledger, &id), 5200.0);
    assert_eq!(ledger.account(&id).unwrap().transactions().len(), 1);

    let err = ledger.withdraw(&id, 5300.0, "car").unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(balance(&ledger, &id), 5200.0);
    assert_eq!(ledger.account(&id).unwrap().transactions().len(), 1);
}

#[test]
fn zero_and_negative_withdrawals_are_invalid() {
    let (mut ledger, _) = ledger_with_watcher();
    let id = open(&mut ledger, AccountCategory::Checking, 100.0);

    assert_eq!(
        ledger.withdraw(&id, 0.0, "").unwrap_err(),
        LedgerError::InvalidAmount(0.0)
    );
    assert_eq!(
        ledger.withdraw(&id, -5.0, "").unwrap_err(),
        LedgerError::InvalidAmount(-5.0)
    );
    assert!(!ledger.can_undo());
}

#[test]
fn balance_matches_opening_plus_net_flow() {
    let (mut ledger, _) = ledger_with_watcher();
    let id = open(&mut ledger, AccountCategory::Checking, 250.0);
    let deposits = [10.0, 99.5, 0.25, 1200.0];
    let withdrawals = [5.0, 300.0, 0.75];

    for amount in deposits {
        ledger.deposit(&id, amount, "in").unwrap();
    }
    for amount in withdrawals {
        ledger.withdraw(&id, amount, "out").unwrap();
    }
    // Rejected operations must not count.
    ledger.withdraw(&id, 1_000_000.0, "too much").unwrap_err();
    ledger.deposit(&id, -1.0, "bad").unwrap_err();

    let expected = 250.0 + deposits.iter().sum::<f64>() - withdrawals.iter().sum::<f64>();
    assert_close(balance(&ledger, &id), expected);
}

#[test]
fn transfer_and_undo_restore_both_accounts() {
    let (mut ledger, _) = ledger_with_watcher();
    let a = open(&mut ledger, AccountCategory::Checking, 500.0);
    let b = open(&mut ledger, AccountCategory::Savings, 0.0);

    let receipt = ledger.transfer(&a, &b, 100.0, "split bill").unwrap();
    assert_eq!(receipt.records.len(), 2);
    assert_eq!(receipt.records[0].kind, TransactionKind::Withdraw);
    assert_eq!(receipt.records[1].kind, TransactionKind::Deposit);
    assert_eq!(balance(&ledger, &a), 400.0);
    assert_eq!(balance(&ledger, &b), 100.0);

    assert!(ledger.undo());
    assert_eq!(balance(&ledger, &a), 500.0);
    assert_eq!(balance(&ledger, &b), 0.0);
    assert!(ledger.account(&a).unwrap().transactions().is_empty());
    assert!(ledger.account(&b).unwrap().transactions().is_empty());
}

#[test]
fn failed_transfer_changes_nothing() {
    let (mut ledger, sink) = ledger_with_watcher();
    let a = open(&mut ledger, AccountCategory::Checking, 50.0);
    let b = open(&mut ledger, AccountCategory::Savings, 0.0);
    sink.drain();

    assert!(matches!(
        ledger.transfer(&a, &b, 75.0, "").unwrap_err(),
        LedgerError::InsufficientFunds { .. }
    ));
    assert_eq!(
        ledger.transfer(&a, &a, 10.0, "").unwrap_err(),
        LedgerError::SameAccountTransfer(a.clone())
    );
    assert_eq!(
        ledger.transfer("ACC-404", &b, 10.0, "").unwrap_err(),
        LedgerError::AccountNotFound("ACC-404".into())
    );

    assert_eq!(balance(&ledger, &a), 50.0);
    assert_eq!(balance(&ledger, &b), 0.0);
    assert!(ledger.all_transactions().is_empty());
    assert!(sink.events().is_empty());
}

#[test]
fn notifications_follow_operations_and_undo() {
    let (mut ledger, sink) = ledger_with_watcher();
    let id = open(&mut ledger, AccountCategory::Savings, 100.0);
    ledger.deposit(&id, 20.0, "gift").unwrap();
    ledger.undo();

    let severities: Vec<Severity> = sink.events().iter().map(|event| event.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Info, Severity::Success, Severity::Warning]
    );
    assert!(sink.events()[1].message.contains("$120.00"));
}

#[test]
fn interest_depends_on_category() {
    let (mut ledger, _) = ledger_with_watcher();
    let savings = open(&mut ledger, AccountCategory::Savings, 1000.0);
    let checking = open(&mut ledger, AccountCategory::Checking, 1000.0);
    let fixed = open(&mut ledger, AccountCategory::Fixed, 1000.0);

    assert_close(ledger.interest_due(&savings, 1.0).unwrap(), 25.0);
    assert_close(ledger.interest_due(&checking, 1.0).unwrap(), 0.0);
    assert_close(ledger.interest_due(&fixed, 2.0).unwrap(), 90.0);
    // Interest is never posted.
    assert!(ledger.all_transactions().is_empty());
}

#[test]
fn global_view_is_newest_first_and_truncates() {
    let (mut ledger, _) = ledger_with_watcher();
    let a = open(&mut ledger, AccountCategory::Checking, 0.0);
    let b = open(&mut ledger, AccountCategory::Savings, 0.0);
    for step in 1..=4 {
        let target = if step % 2 == 0 { &b } else { &a };
        ledger.deposit(target, step as f64, &format!("step {step}")).unwrap();
    }

    let all = ledger.all_transactions();
    let descriptions: Vec<&str> = all.iter().map(|r| r.description.as_str()).collect();
    assert_eq!(descriptions, vec!["step 4", "step 3", "step 2", "step 1"]);

    let recent = ledger.recent_transactions(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].description, "step 4");
    assert_eq!(ledger.recent_transactions(10).len(), 4);
}

#[test]
fn snapshots_and_category_totals() {
    let (mut ledger, _) = ledger_with_watcher();
    let savings = open(&mut ledger, AccountCategory::Savings, 300.0);
    open(&mut ledger, AccountCategory::Savings, 200.0);
    open(&mut ledger, AccountCategory::Checking, 75.0);
    ledger.withdraw(&savings, 100.0, "").unwrap();

    let snapshots = ledger.accounts();
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].id, savings);
    assert_eq!(snapshots[0].balance, 200.0);
    assert_eq!(snapshots[0].rate, 2.5);
    assert_eq!(snapshots[0].transaction_count, 1);

    let totals = ledger.balances_by_category();
    assert_eq!(totals[&AccountCategory::Savings], 400.0);
    assert_eq!(totals[&AccountCategory::Checking], 75.0);
    assert!(!totals.contains_key(&AccountCategory::Fixed));
}
