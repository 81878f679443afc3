//! Account number allocation
//!
//! Account numbers are random 10-digit strings. A candidate is checked
//! against the store and redrawn on collision, up to a fixed number of
//! attempts.

use rand::Rng;

use crate::error::{AppError, AppResult};
use crate::store::AccountStore;

/// Lowest account number (inclusive)
pub const ACCOUNT_NUMBER_MIN: u64 = 1_000_000_000;
/// Upper bound (exclusive)
pub const ACCOUNT_NUMBER_MAX: u64 = 9_999_999_999;

/// Default attempt budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Draw a random account number
pub fn random_account_number() -> String {
    rand::thread_rng()
        .gen_range(ACCOUNT_NUMBER_MIN..ACCOUNT_NUMBER_MAX)
        .to_string()
}

/// Allocates account numbers that are not yet on file
#[derive(Debug, Clone, Copy)]
pub struct AccountNumberGenerator {
    max_attempts: u32,
}

impl Default for AccountNumberGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl AccountNumberGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Find a free account number drawing candidates from `next_candidate`.
    ///
    /// `used` counts every draw across calls; once it reaches `max_attempts`
    /// the allocation fails with `GenerationExhausted`.
    pub async fn allocate_within<F>(
        &self,
        store: &dyn AccountStore,
        used: &mut u32,
        mut next_candidate: F,
    ) -> AppResult<String>
    where
        F: FnMut() -> String + Send,
    {
        while *used < self.max_attempts {
            *used += 1;
            let candidate = next_candidate();
            if store.find_by_account_number(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(attempt = *used, candidate = %candidate, "Account number collision");
        }

        Err(AppError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}
