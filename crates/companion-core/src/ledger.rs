//! Reward point ledger.
//!
//! The streak engine never touches balances. Whoever records a check-in
//! credits `stars_earned` here as a separate step.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{LedgerError, StorageError};
use crate::reward::Reward;

pub trait RewardLedger {
    /// Add points; returns the new balance.
    fn credit(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64, LedgerError>;

    /// Remove points; fails without change when the balance is too low.
    fn debit(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64, LedgerError>;

    fn balance(&self, user_id: &str) -> Result<i64, LedgerError>;
}

impl<T: RewardLedger + ?Sized> RewardLedger for &T {
    fn credit(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64, LedgerError> {
        (**self).credit(user_id, amount, reason)
    }

    fn debit(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64, LedgerError> {
        (**self).debit(user_id, amount, reason)
    }

    fn balance(&self, user_id: &str) -> Result<i64, LedgerError> {
        (**self).balance(user_id)
    }
}

/// Spend points on a reward. Badges (cost 0) cost nothing and always succeed.
///
/// Returns the balance after redemption.
pub fn redeem<L: RewardLedger + ?Sized>(
    ledger: &L,
    user_id: &str,
    reward: &Reward,
) -> Result<i64, LedgerError> {
    if reward.cost_points == 0 {
        return ledger.balance(user_id);
    }
    let balance = ledger.debit(
        user_id,
        reward.cost_points,
        &format!("redeem:{}", reward.id),
    )?;
    tracing::info!(user_id, reward = %reward.id, balance, "reward redeemed");
    Ok(balance)
}

/// Balances kept in process.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<String, i64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RewardLedger for MemoryLedger {
    fn credit(&self, user_id: &str, amount: i64, _reason: &str) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut balances = self.balances.lock().map_err(StorageError::from)?;
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    fn debit(&self, user_id: &str, amount: i64, _reason: &str) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let mut balances = self.balances.lock().map_err(StorageError::from)?;
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        if *balance < amount {
            return Err(LedgerError::InsufficientPoints {
                user_id: user_id.to_string(),
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }

    fn balance(&self, user_id: &str) -> Result<i64, LedgerError> {
        let balances = self.balances.lock().map_err(StorageError::from)?;
        Ok(balances.get(user_id).copied().unwrap_or(0))
    }
}
