use derive_new::new;

use crate::{u256_to_f64, U256};

/// Seconds in a 365 day year, the basis used for every APR figure.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Read-only view of a staking pool, refreshed by the external read-cache.
/// Amounts are base units of the staked token.
#[derive(Debug, Clone, PartialEq, Eq, Default, new, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolParameters {
    /// everything currently deposited
    pub total_staked: U256,
    /// reward emitted per second, in base units of the reward token
    pub reward_rate_per_unit_time: U256,
    /// zero means no minimum
    pub min_stake: U256,
    /// zero means no maximum
    pub max_stake: U256,
    /// lock applied from each deposit
    pub lock_period_seconds: u64,
    /// deducted on withdrawals made while locked
    pub early_withdraw_penalty_percent: u32,
    /// extra reward granted on compound
    pub compound_bonus_percent: u32,
    /// staked token decimals
    pub decimals: u8,
}

impl PoolParameters {
    /// APR implied by the current emission rate, assuming reward and stake
    /// tokens share decimals. `None` while nothing is staked.
    pub fn estimated_apr_percent(&self) -> Option<f64> {
        if self.total_staked.is_zero() {
            return None;
        }
        let yearly = u256_to_f64(self.reward_rate_per_unit_time) * SECONDS_PER_YEAR as f64;
        Some(yearly / u256_to_f64(self.total_staked) * 100.0)
    }

    /// Whether the pool enforces a minimum deposit
    pub fn has_min_stake(&self) -> bool {
        !self.min_stake.is_zero()
    }

    /// Whether the pool enforces a maximum deposit
    pub fn has_max_stake(&self) -> bool {
        !self.max_stake.is_zero()
    }

    /// The contract pushes the lock end forward on every accepted deposit,
    /// whatever lock was running before.
    pub fn lock_end_after_deposit(&self, now: u64) -> u64 {
        now.saturating_add(self.lock_period_seconds)
    }
}

/// Read-only view of the account's position in a pool. Timestamps are unix
/// seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, new, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPosition {
    /// deposited and not yet withdrawn
    pub staked_amount: U256,
    /// claimable reward
    pub pending_reward: U256,
    /// withdrawals before this pay the penalty
    pub lock_end_timestamp: u64,
    /// last claim, unix seconds
    pub last_harvest_timestamp: u64,
}

impl UserPosition {
    /// Whether a withdrawal at `now` would be penalised
    pub fn is_locked(&self, now: u64) -> bool {
        now < self.lock_end_timestamp
    }

    /// Seconds until the lock ends, zero once unlocked
    pub fn lock_remaining(&self, now: u64) -> u64 {
        self.lock_end_timestamp.saturating_sub(now)
    }

    /// Penalty the contract would deduct if `amount` were withdrawn right now.
    /// Display only: the contract remains the authority.
    pub fn early_withdraw_penalty(&self, amount: U256, pool: &PoolParameters, now: u64) -> U256 {
        if !self.is_locked(now) {
            return U256::zero();
        }
        amount.saturating_mul(U256::from(pool.early_withdraw_penalty_percent)) / U256::from(100u8)
    }
}
