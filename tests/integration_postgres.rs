//! PostgreSQL store tests
//!
//! Need a reachable `DATABASE_URL`; run with `cargo test -- --ignored`.

use std::sync::Arc;

use rust_decimal_macros::dec;

use account_service::domain::{verify_chain, NewAccount, OperationContext};
use account_service::handlers::{
    random_account_number, AccountNumberGenerator, CashCommand, CashHandler,
    RegisterAccountCommand, RegisterAccountHandler,
};
use account_service::store::{
    AccountStore, PgAccountStore, StoreError, ID_NUMBER_CONSTRAINT, PHONE_NUMBER_CONSTRAINT,
};
use account_service::{db, AppError, DomainError};

mod common;

use common::unique_identity;

async fn store() -> Arc<dyn AccountStore> {
    let pool = common::setup_test_db().await;
    assert!(db::check_schema(&pool).await.unwrap());
    Arc::new(PgAccountStore::new(pool))
}

#[tokio::test]
#[ignore]
async fn test_unique_constraints_are_named() {
    let store = store().await;
    let (id_number, phone) = unique_identity();

    let account = store
        .insert_account(NewAccount {
            account_number: random_account_number(),
            full_name: "John Doe".to_string(),
            id_number: id_number.clone(),
            phone_number: phone.clone(),
        })
        .await
        .unwrap();
    assert_eq!(account.balance, dec!(0));

    let (_, other_phone) = unique_identity();
    let err = store
        .insert_account(NewAccount {
            account_number: random_account_number(),
            full_name: "Jane Doe".to_string(),
            id_number: id_number.clone(),
            phone_number: other_phone,
        })
        .await
        .unwrap_err();
    assert_eq!(err.violated_constraint(), Some(ID_NUMBER_CONSTRAINT));

    let (other_id, _) = unique_identity();
    let err = store
        .insert_account(NewAccount {
            account_number: random_account_number(),
            full_name: "Jane Doe".to_string(),
            id_number: other_id,
            phone_number: phone,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));
    assert_eq!(err.violated_constraint(), Some(PHONE_NUMBER_CONSTRAINT));
}

#[tokio::test]
#[ignore]
async fn test_dropped_unit_rolls_back() {
    let store = store().await;
    let (id_number, phone) = unique_identity();
    let register = RegisterAccountHandler::new(store.clone(), AccountNumberGenerator::default());
    let account = register
        .execute(
            RegisterAccountCommand::new("John Doe", id_number, phone),
            &OperationContext::new(),
        )
        .await
        .unwrap();

    {
        let mut unit = store.begin().await.unwrap();
        let locked = unit.lock_account(&account.account_number).await.unwrap().unwrap();
        unit.update_balance(locked.id, dec!(999)).await.unwrap();
        // dropped without commit
    }

    let reloaded = store
        .find_by_account_number(&account.account_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.balance, dec!(0));
}

#[tokio::test]
#[ignore]
async fn test_cash_operations_keep_chain() {
    let store = store().await;
    let (id_number, phone) = unique_identity();
    let ctx = OperationContext::new();
    let register = RegisterAccountHandler::new(store.clone(), AccountNumberGenerator::default());
    let cash = Arc::new(CashHandler::new(store.clone()));

    let account = register
        .execute(RegisterAccountCommand::new("John Doe", id_number, phone), &ctx)
        .await
        .unwrap();
    let number = account.account_number.clone();

    let result = cash
        .deposit(CashCommand::new(&number, dec!(1000000)), &ctx)
        .await
        .unwrap();
    assert_eq!(result.balance(), dec!(1000000));
    assert_eq!(result.entry.reference_id, None);
    assert_eq!(result.entry.description, "Deposit");

    let result = cash
        .withdraw(CashCommand::new(&number, dec!(250000)), &ctx)
        .await
        .unwrap();
    assert_eq!(result.balance(), dec!(750000));
    assert!(result.entry.reference_id.is_some());

    let err = cash
        .withdraw(CashCommand::new(&number, dec!(5000000)), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::InsufficientBalance { .. })));

    // Concurrent operations serialize on the account row
    let mut tasks = Vec::new();
    for i in 0..20 {
        let cash = cash.clone();
        let number = number.clone();
        tasks.push(tokio::spawn(async move {
            let ctx = OperationContext::new();
            if i % 2 == 0 {
                cash.deposit(CashCommand::new(number, dec!(10.25)), &ctx).await
            } else {
                cash.withdraw(CashCommand::new(number, dec!(5.25)), &ctx).await
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let account = store.find_by_account_number(&number).await.unwrap().unwrap();
    let entries = store.entries_for_account(account.id).await.unwrap();
    assert_eq!(entries.len(), 22);
    assert_eq!(verify_chain(&account, &entries).unwrap(), dec!(750050));
}
