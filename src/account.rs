//! Account entity and its balance arithmetic.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// A persisted ledger account.
///
/// # Invariants
///
/// - `id` is assigned once by the allocator and never changes
/// - `balance` starts at zero and only moves through [`Account::adjust`]
///
/// # Negative Balance
///
/// No floor is enforced: adjustments may take the balance below zero. Only
/// leaving the `i64` range is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier, never reused.
    pub id: u64,

    /// Holder's first name. Stored as given.
    pub first_name: String,

    /// Holder's last name. Stored as given.
    pub last_name: String,

    /// Reserved account number. Always zero; no operation assigns it.
    #[serde(default)]
    pub number: i64,

    /// Signed balance in minor units.
    #[serde(default)]
    pub balance: i64,
}

impl Account {
    /// Creates a new account with a zero balance.
    pub fn new(id: u64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Account {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            number: 0,
            balance: 0,
        }
    }

    /// Adds `delta` to the balance.
    ///
    /// Fails with `InvalidArgument` if the result would overflow, in which
    /// case the balance is left unchanged.
    pub fn adjust(&mut self, delta: i64) -> Result<()> {
        self.balance = self.balance.checked_add(delta).ok_or_else(|| {
            LedgerError::InvalidArgument(format!(
                "adjusting account {} by {} overflows balance {}",
                self.id, delta, self.balance
            ))
        })?;
        Ok(())
    }
}
