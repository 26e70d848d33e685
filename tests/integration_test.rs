mod common;

use anyhow::Result;
use common::{StandardAccounts, open, test_service};
use tally::application::AppError;
use tally::domain::{LedgerError, TransactionKind, TxId};

#[test]
fn test_alice_and_bob_scenario() -> Result<()> {
    let (mut service, _temp) = test_service()?;

    service.create_account("A001", "Alice", 0)?;
    service.deposit("A001", 500, "init")?;
    assert_eq!(service.balance("A001")?, 500);
    assert_eq!(service.transactions().len(), 1);
    assert_eq!(service.transactions()[0].kind, TransactionKind::Deposit);

    // Overdraw is rejected and changes nothing
    let result = service.withdraw("A001", 600, "too much");
    assert!(matches!(
        result,
        Err(AppError::Ledger(LedgerError::InsufficientFunds { .. }))
    ));
    assert_eq!(service.balance("A001")?, 500);
    assert_eq!(service.transactions().len(), 1);

    service.create_account("A002", "Bob", 0)?;
    service.transfer("A001", "A002", 500, "pay bob")?;
    assert_eq!(service.balance("A001")?, 0);
    assert_eq!(service.balance("A002")?, 500);
    assert_eq!(service.transactions().len(), 2);

    let statement = service.statement("A001", 10)?;
    let kinds: Vec<TransactionKind> = statement.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TransactionKind::Transfer, TransactionKind::Deposit]
    );

    Ok(())
}

#[test]
fn test_deposit_to_unknown_account() -> Result<()> {
    let (mut service, _temp) = test_service()?;
    StandardAccounts::create(&mut service)?;

    let result = service.deposit("X", 500, "");
    assert!(matches!(
        result,
        Err(AppError::Ledger(LedgerError::AccountNotFound(ref id))) if id == "X"
    ));
    assert!(service.transactions().is_empty());

    Ok(())
}

#[test]
fn test_duplicate_account_rejected() -> Result<()> {
    let (mut service, _temp) = test_service()?;
    service.create_account("A001", "Alice", 100)?;

    let result = service.create_account("A001", "Impostor", 0);
    assert!(matches!(
        result,
        Err(AppError::Ledger(LedgerError::AccountAlreadyExists(_)))
    ));
    assert_eq!(service.list_accounts().len(), 1);
    assert_eq!(service.list_accounts()[0].name, "Alice");

    Ok(())
}

#[test]
fn test_each_operation_adds_one_increasing_tx() -> Result<()> {
    let (mut service, _temp) = test_service()?;
    StandardAccounts::create_funded(&mut service, 1000)?;

    let mut last = service.transactions().last().map(|t| t.tx_id).unwrap();
    let mut count = service.transactions().len();

    for step in 0..6 {
        let tx = match step % 3 {
            0 => service.deposit("A002", 10, "")?,
            1 => service.withdraw("A001", 10, "")?,
            _ => service.transfer("A001", "A002", 10, "")?,
        };
        assert!(tx.tx_id > last);
        assert_eq!(service.transactions().len(), count + 1);
        last = tx.tx_id;
        count += 1;
    }

    // Failed operations leave the count alone
    assert!(service.withdraw("A001", 1_000_000, "").is_err());
    assert!(service.transfer("A001", "nobody", 1, "").is_err());
    assert_eq!(service.transactions().len(), count);

    Ok(())
}

#[test]
fn test_state_survives_reopen() -> Result<()> {
    let (mut service, temp) = test_service()?;
    StandardAccounts::create_funded(&mut service, 800)?;
    service.transfer("A001", "A002", 300, "split, evenly")?;
    drop(service);

    let reopened = open(&temp)?;
    assert!(reopened.load_report().is_empty());
    assert_eq!(reopened.balance("A001")?, 500);
    assert_eq!(reopened.balance("A002")?, 300);
    assert_eq!(reopened.transactions().len(), 2);
    assert_eq!(reopened.transactions()[1].note, "split, evenly");

    Ok(())
}

#[test]
fn test_tx_ids_continue_after_restart() -> Result<()> {
    let (mut service, temp) = test_service()?;
    StandardAccounts::create_funded(&mut service, 100)?;
    service.withdraw("A001", 10, "")?;
    drop(service);

    let mut reopened = open(&temp)?;
    let tx = reopened.deposit("A002", 5, "")?;
    assert_eq!(tx.tx_id, TxId::new(3));
    assert_eq!(tx.tx_id.to_string(), "0000000003");

    Ok(())
}

#[test]
fn test_statement_is_filtered_subsequence() -> Result<()> {
    let (mut service, _temp) = test_service()?;
    StandardAccounts::create_funded(&mut service, 1000)?;
    service.create_account("A003", "Carol", 0)?;

    service.transfer("A001", "A003", 100, "c1")?;
    service.transfer("A001", "A002", 100, "b1")?;
    service.deposit("A003", 50, "c2")?;
    service.transfer("A003", "A002", 20, "b2")?;
    service.withdraw("A002", 5, "b3")?;

    let full: Vec<TxId> = service
        .transactions()
        .iter()
        .rev()
        .filter(|t| t.touches("A002"))
        .map(|t| t.tx_id)
        .collect();

    for limit in 0..5 {
        let rows = service.statement("A002", limit)?;
        assert!(rows.len() <= limit);
        assert!(rows.iter().all(|t| t.touches("A002")));
        let ids: Vec<TxId> = rows.iter().map(|t| t.tx_id).collect();
        assert_eq!(ids, full[..ids.len()].to_vec());
    }

    let notes: Vec<&str> = service
        .statement("A002", 10)?
        .iter()
        .map(|t| t.note.as_str())
        .collect();
    assert_eq!(notes, vec!["b3", "b2", "b1"]);

    Ok(())
}

#[test]
fn test_statement_unknown_account() -> Result<()> {
    let (service, _temp) = test_service()?;
    assert!(matches!(
        service.statement("ghost", 10),
        Err(AppError::Ledger(LedgerError::AccountNotFound(_)))
    ));
    Ok(())
}

#[test]
fn test_balances_track_net_movement() -> Result<()> {
    let (mut service, _temp) = test_service()?;
    StandardAccounts::create(&mut service)?;

    let mut expected_a: i64 = 0;
    let mut expected_b: i64 = 0;

    for (i, amount) in [120_i64, 75, 300, 1, 999, 40].into_iter().enumerate() {
        match i % 3 {
            0 => {
                service.deposit("A001", amount, "")?;
                expected_a += amount;
            }
            1 => {
                if service.transfer("A001", "A002", amount, "").is_ok() {
                    expected_a -= amount;
                    expected_b += amount;
                }
            }
            _ => {
                if service.withdraw("A002", amount, "").is_ok() {
                    expected_b -= amount;
                }
            }
        }
        assert_eq!(service.balance("A001")?, expected_a);
        assert_eq!(service.balance("A002")?, expected_b);
        assert!(expected_a >= 0 && expected_b >= 0);
    }

    Ok(())
}

#[test]
fn test_export_json_snapshot() -> Result<()> {
    let (mut service, _temp) = test_service()?;
    StandardAccounts::create_funded(&mut service, 250)?;

    let mut buf = Vec::new();
    let snapshot = service.export_json(&mut buf)?;
    assert_eq!(snapshot.accounts.len(), 2);
    assert_eq!(snapshot.transactions.len(), 1);

    let json: serde_json::Value = serde_json::from_slice(&buf)?;
    assert_eq!(json["accounts"][0]["id"], "A001");
    assert_eq!(json["accounts"][0]["balance_cents"], 250);
    assert_eq!(json["transactions"][0]["tx_id"], "0000000001");
    assert_eq!(json["transactions"][0]["timestamp"], "2024-01-15T09:30:00");

    Ok(())
}
