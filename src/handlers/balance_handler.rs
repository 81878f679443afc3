//! Balance Handler

use std::sync::Arc;

use crate::domain::Account;
use crate::error::{AppError, AppResult};
use crate::store::AccountStore;

use super::commands::numeric;

/// Read-only account lookup
pub struct BalanceHandler {
    store: Arc<dyn AccountStore>,
}

impl BalanceHandler {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Fetch the account (and with it the current balance)
    pub async fn execute(&self, account_number: &str) -> AppResult<Account> {
        if let Err(e) = numeric(account_number) {
            let message = e.message.map(|m| m.to_string()).unwrap_or_default();
            return Err(AppError::invalid_field("account_number", &e.code, message));
        }

        self.store
            .find_by_account_number(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_unknown_account() {
        let handler = BalanceHandler::new(Arc::new(MemoryStore::new()));
        let result = handler.execute("1234567890").await;
        assert!(matches!(result, Err(AppError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_non_numeric_account_number() {
        let handler = BalanceHandler::new(Arc::new(MemoryStore::new()));
        let err = handler.execute("abc").await.unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["account_number"]);
    }
}
