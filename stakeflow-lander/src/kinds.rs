use std::collections::HashMap;
use std::time::Duration;

use strum::IntoEnumIterator;

use stakeflow_core::{OperationKind, U256};

use crate::cache::CacheKey;
use crate::settings::KindOverride;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const EXTENDED_TIMEOUT: Duration = Duration::from_secs(180);

/// Per-kind knobs the state machine applies to every operation of that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConfig {
    /// how long to wait for a receipt once submitted
    pub timeout: Duration,
    pub gas_limit: U256,
    /// refetched once an operation of this kind succeeds
    pub invalidates: &'static [CacheKey],
}

impl KindConfig {
    pub fn default_for(kind: OperationKind) -> Self {
        use CacheKey::*;

        let (timeout, gas_limit, invalidates): (_, u64, &'static [CacheKey]) = match kind {
            OperationKind::Approve => (DEFAULT_TIMEOUT, 100_000, &[Allowance]),
            OperationKind::Stake => (
                DEFAULT_TIMEOUT,
                300_000,
                &[Balance, Allowance, UserPosition, PendingReward, PoolParameters],
            ),
            OperationKind::Unstake => (
                DEFAULT_TIMEOUT,
                300_000,
                &[Balance, UserPosition, PendingReward, PoolParameters],
            ),
            OperationKind::Harvest => (
                DEFAULT_TIMEOUT,
                250_000,
                &[PendingReward, Balance, UserPosition],
            ),
            OperationKind::Compound => (
                DEFAULT_TIMEOUT,
                350_000,
                &[PendingReward, UserPosition, PoolParameters],
            ),
            OperationKind::AddLiquidity => {
                (EXTENDED_TIMEOUT, 400_000, &[Balance, Allowance, LpBalance])
            }
            OperationKind::RemoveLiquidity => {
                (EXTENDED_TIMEOUT, 400_000, &[Balance, Allowance, LpBalance])
            }
            OperationKind::Contribute => {
                (EXTENDED_TIMEOUT, 300_000, &[Balance, Allowance, SaleInfo])
            }
            OperationKind::EmergencyWithdraw => (
                DEFAULT_TIMEOUT,
                250_000,
                &[Balance, UserPosition, PendingReward, PoolParameters],
            ),
        };
        Self {
            timeout,
            gas_limit: U256::from(gas_limit),
            invalidates,
        }
    }

    fn with_override(mut self, kind_override: &KindOverride) -> Self {
        if let Some(secs) = kind_override.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(gas_limit) = kind_override.gas_limit {
            self.gas_limit = U256::from(gas_limit);
        }
        self
    }
}

/// Resolved configuration for every kind.
#[derive(Debug, Clone)]
pub struct KindTable {
    entries: HashMap<OperationKind, KindConfig>,
}

impl KindTable {
    pub fn new(overrides: &HashMap<OperationKind, KindOverride>) -> Self {
        let entries = OperationKind::iter()
            .map(|kind| {
                let config = KindConfig::default_for(kind);
                let config = match overrides.get(&kind) {
                    Some(kind_override) => config.with_override(kind_override),
                    None => config,
                };
                (kind, config)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, kind: OperationKind) -> KindConfig {
        self.entries
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| KindConfig::default_for(kind))
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}
