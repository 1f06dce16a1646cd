use chrono::{ DateTime, Duration, Utc };
use serde::Serialize;

use crate::error::{ AppError, Result };

pub const MAX_LOCK_DAYS: i64 = 3650;

/// Lock state of a budget or goal wallet, derived at read time.
///
/// A lock expires on its own: once `lock_until` has passed the wallet reads as
/// unlocked even if the stored flag was never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    Unlocked,
    LockedUntil {
        until: DateTime<Utc>,
    },
}

impl LockState {
    pub fn evaluate(is_locked: bool, lock_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match (is_locked, lock_until) {
            (true, Some(until)) if until > now => LockState::LockedUntil { until },
            _ => LockState::Unlocked,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::LockedUntil { .. })
    }

    pub fn ensure_unlocked(&self) -> Result<()> {
        match self {
            LockState::Unlocked => Ok(()),
            LockState::LockedUntil { until } => Err(AppError::WalletLocked { until: *until }),
        }
    }
}

/// Expiry for a new lock of `days` days starting at `now`.
pub fn lock_expiry(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    if !(1..=MAX_LOCK_DAYS).contains(&days) {
        return Err(
            AppError::InvalidInput(format!("Lock duration must be between 1 and {} days", MAX_LOCK_DAYS))
        );
    }
    Ok(now + Duration::days(days))
}
