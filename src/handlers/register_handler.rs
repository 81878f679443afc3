//! Registration Handler
//!
//! Opens a new customer account with a zero balance.

use std::sync::Arc;

use validator::Validate;

use crate::domain::{Account, NewAccount, OperationContext};
use crate::error::{AppError, AppResult};
use crate::store::{
    AccountStore, StoreError, ACCOUNT_NUMBER_CONSTRAINT, ID_NUMBER_CONSTRAINT,
    PHONE_NUMBER_CONSTRAINT,
};

use super::{random_account_number, AccountNumberGenerator, RegisterAccountCommand};

/// Handler for account registration
pub struct RegisterAccountHandler {
    store: Arc<dyn AccountStore>,
    generator: AccountNumberGenerator,
}

impl RegisterAccountHandler {
    pub fn new(store: Arc<dyn AccountStore>, generator: AccountNumberGenerator) -> Self {
        Self { store, generator }
    }

    /// Execute the registration command
    pub async fn execute(
        &self,
        command: RegisterAccountCommand,
        context: &OperationContext,
    ) -> AppResult<Account> {
        command.validate()?;

        if self.store.find_by_id_number(&command.id_number).await?.is_some() {
            return Err(AppError::DuplicateIdNumber);
        }
        if self
            .store
            .find_by_phone_number(&command.phone_number)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicatePhoneNumber);
        }

        // The pre-checks can race a concurrent registration; the unique
        // constraints have the final word. An account number taken in the
        // meantime costs one attempt of the generator budget, which is shared
        // between lookups and inserts.
        let mut used = 0;
        loop {
            let account_number = self
                .generator
                .allocate_within(self.store.as_ref(), &mut used, random_account_number)
                .await?;

            let new_account = NewAccount {
                account_number,
                full_name: command.full_name.clone(),
                id_number: command.id_number.clone(),
                phone_number: command.phone_number.clone(),
            };

            match self.store.insert_account(new_account).await {
                Ok(account) => {
                    tracing::info!(
                        account_number = %account.account_number,
                        correlation_id = ?context.correlation_id,
                        "Account registered"
                    );
                    return Ok(account);
                }
                Err(err) => match err.violated_constraint() {
                    Some(ID_NUMBER_CONSTRAINT) => return Err(AppError::DuplicateIdNumber),
                    Some(PHONE_NUMBER_CONSTRAINT) => return Err(AppError::DuplicatePhoneNumber),
                    Some(ACCOUNT_NUMBER_CONSTRAINT) => {
                        tracing::warn!(attempts = used, "Account number taken concurrently, retrying");
                    }
                    _ => return Err(persistence(err)),
                },
            }
        }
    }
}

fn persistence(err: StoreError) -> AppError {
    tracing::error!("Failed to create account: {}", err);
    AppError::Persistence(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::CashActivity;
    use crate::store::{LedgerUnit, MemoryStore, StoreFault, StoreResult};

    /// Store whose lookups always miss, as if another registration committed
    /// between the pre-checks and the insert. Inserts fail with the scripted
    /// constraint violations first, then go through.
    struct RacingStore {
        inner: MemoryStore,
        violations: Mutex<VecDeque<&'static str>>,
        inserts: AtomicU32,
    }

    impl RacingStore {
        fn new(violations: &[&'static str]) -> Self {
            Self {
                inner: MemoryStore::new(),
                violations: Mutex::new(violations.iter().copied().collect()),
                inserts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl AccountStore for RacingStore {
        async fn ping(&self) -> StoreResult<()> {
            self.inner.ping().await
        }

        async fn find_by_account_number(&self, _: &str) -> StoreResult<Option<Account>> {
            Ok(None)
        }

        async fn find_by_id_number(&self, _: &str) -> StoreResult<Option<Account>> {
            Ok(None)
        }

        async fn find_by_phone_number(&self, _: &str) -> StoreResult<Option<Account>> {
            Ok(None)
        }

        async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let violation = self.violations.lock().unwrap().pop_front();
            match violation {
                Some(constraint) => Err(StoreError::UniqueViolation {
                    constraint: constraint.to_string(),
                }),
                None => self.inner.insert_account(account).await,
            }
        }

        async fn entries_for_account(&self, account_id: i64) -> StoreResult<Vec<CashActivity>> {
            self.inner.entries_for_account(account_id).await
        }

        async fn begin(&self) -> StoreResult<Box<dyn LedgerUnit>> {
            self.inner.begin().await
        }
    }

    async fn register_racing(
        store: Arc<RacingStore>,
        max_attempts: u32,
    ) -> AppResult<Account> {
        RegisterAccountHandler::new(store, AccountNumberGenerator::new(max_attempts))
            .execute(
                RegisterAccountCommand::new("John Doe", "1234567890123456", "081234567890"),
                &OperationContext::new(),
            )
            .await
    }

    #[tokio::test]
    async fn test_insert_race_on_id_number() {
        let store = Arc::new(RacingStore::new(&[ID_NUMBER_CONSTRAINT]));

        let result = register_racing(store.clone(), 16).await;

        assert!(matches!(result, Err(AppError::DuplicateIdNumber)));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.account_count().await, 0);
    }

    #[tokio::test]
    async fn test_insert_race_on_phone_number() {
        let store = Arc::new(RacingStore::new(&[PHONE_NUMBER_CONSTRAINT]));

        let result = register_racing(store.clone(), 16).await;

        assert!(matches!(result, Err(AppError::DuplicatePhoneNumber)));
        assert_eq!(store.inner.account_count().await, 0);
    }

    #[tokio::test]
    async fn test_account_number_race_retries_once() {
        let store = Arc::new(RacingStore::new(&[ACCOUNT_NUMBER_CONSTRAINT]));

        let account = register_racing(store.clone(), 16).await.unwrap();

        assert_eq!(account.account_number.len(), 10);
        assert_eq!(store.inserts.load(Ordering::SeqCst), 2);
        assert_eq!(store.inner.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_account_number_race_exhausts_shared_budget() {
        let store = Arc::new(RacingStore::new(&[ACCOUNT_NUMBER_CONSTRAINT; 5]));

        let result = register_racing(store.clone(), 3).await;

        assert!(matches!(result, Err(AppError::GenerationExhausted { attempts: 3 })));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 3);
        assert_eq!(store.inner.account_count().await, 0);
    }

    fn handler(store: &MemoryStore) -> RegisterAccountHandler {
        RegisterAccountHandler::new(Arc::new(store.clone()), AccountNumberGenerator::default())
    }

    #[tokio::test]
    async fn test_register_john_doe() {
        let store = MemoryStore::new();
        let account = handler(&store)
            .execute(
                RegisterAccountCommand::new("John Doe", "1234567890123456", "081234567890"),
                &OperationContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(account.account_number.len(), 10);
        assert!(account.account_number.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(account.balance, rust_decimal::Decimal::ZERO);
        assert_eq!(account.full_name, "John Doe");
    }

    #[tokio::test]
    async fn test_insert_failure_leaves_nothing_behind() {
        let store = MemoryStore::new();
        store.fail_next(StoreFault::InsertAccount);

        let result = handler(&store)
            .execute(
                RegisterAccountCommand::new("John Doe", "1234567890123456", "081234567890"),
                &OperationContext::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert_eq!(store.account_count().await, 0);
    }
}
