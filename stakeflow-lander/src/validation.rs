use stakeflow_core::{OperationKind, PoolParameters, UserPosition, U256};

use crate::calls::OperationParams;

/// Local reasons an operation is refused before anything touches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} needs an amount greater than zero")]
    ZeroAmount(OperationKind),
    #[error("Amount {amount} is below the pool minimum of {minimum}")]
    BelowMinimum { amount: U256, minimum: U256 },
    #[error("Position would reach {total}, above the pool maximum of {maximum}")]
    ExceedsMaximum { total: U256, maximum: U256 },
    #[error("Amount {required} exceeds the available balance of {available}")]
    InsufficientBalance { required: U256, available: U256 },
    #[error("Amount {required} exceeds the approved allowance of {available}")]
    InsufficientAllowance { required: U256, available: U256 },
    #[error("Amount {requested} exceeds the staked amount of {staked}")]
    ExceedsStaked { requested: U256, staked: U256 },
    #[error("There is no pending reward to {0}")]
    NothingToClaim(OperationKind),
    #[error("Minimum {minimum} is above the desired amount {desired}")]
    MinimumAboveDesired { minimum: U256, desired: U256 },
}

/// Snapshot of the read-cache an operation is validated against. Anything
/// left as `None` is not known to the caller and is not checked; the
/// contract stays the final authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    /// balance of the asset being spent (LP token for `RemoveLiquidity`)
    pub balance: Option<U256>,
    /// allowance granted to the target contract; `None` for native assets
    pub allowance: Option<U256>,
    /// `AddLiquidity` only: balance of `token_b`, or of the native asset when
    /// the pair is native
    pub balance_b: Option<U256>,
    /// `AddLiquidity` only: allowance of `token_b`, ignored for native pairs
    pub allowance_b: Option<U256>,
    pub pool: Option<PoolParameters>,
    pub position: Option<UserPosition>,
}

/// Check `params` against the known state. Returns the first failed rule.
pub fn validate(params: &OperationParams, context: &ValidationContext) -> Result<(), ValidationError> {
    let kind = params.kind();

    if let Some(amount) = params.amount() {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount(kind));
        }
        check_pool_bounds(kind, amount, context)?;
        check_funds(kind, amount, context)?;
        check_position(kind, amount, context)?;
    } else {
        check_pending_reward(kind, context)?;
    }

    if let OperationParams::AddLiquidity {
        token_b, amounts, ..
    } = params
    {
        let allowance_b = token_b.and(context.allowance_b);
        check_available(amounts.amount_b_desired, context.balance_b, allowance_b)?;
        check_minimum(amounts.amount_a_min, amounts.amount_a_desired)?;
        check_minimum(amounts.amount_b_min, amounts.amount_b_desired)?;
    }
    Ok(())
}

fn check_pool_bounds(
    kind: OperationKind,
    amount: U256,
    context: &ValidationContext,
) -> Result<(), ValidationError> {
    let (OperationKind::Stake, Some(pool)) = (kind, &context.pool) else {
        return Ok(());
    };
    if pool.has_min_stake() && amount < pool.min_stake {
        return Err(ValidationError::BelowMinimum {
            amount,
            minimum: pool.min_stake,
        });
    }
    if pool.has_max_stake() {
        let staked = context
            .position
            .as_ref()
            .map(|position| position.staked_amount)
            .unwrap_or_default();
        let total = staked.saturating_add(amount);
        if total > pool.max_stake {
            return Err(ValidationError::ExceedsMaximum {
                total,
                maximum: pool.max_stake,
            });
        }
    }
    Ok(())
}

fn check_funds(
    kind: OperationKind,
    amount: U256,
    context: &ValidationContext,
) -> Result<(), ValidationError> {
    if !kind.spends_allowance() {
        return Ok(());
    }
    check_available(amount, context.balance, context.allowance)
}

fn check_available(
    amount: U256,
    balance: Option<U256>,
    allowance: Option<U256>,
) -> Result<(), ValidationError> {
    if let Some(available) = balance {
        if amount > available {
            return Err(ValidationError::InsufficientBalance {
                required: amount,
                available,
            });
        }
    }
    if let Some(available) = allowance {
        if amount > available {
            return Err(ValidationError::InsufficientAllowance {
                required: amount,
                available,
            });
        }
    }
    Ok(())
}

fn check_position(
    kind: OperationKind,
    amount: U256,
    context: &ValidationContext,
) -> Result<(), ValidationError> {
    if !matches!(kind, OperationKind::Unstake | OperationKind::EmergencyWithdraw) {
        return Ok(());
    }
    match &context.position {
        Some(position) if amount > position.staked_amount => Err(ValidationError::ExceedsStaked {
            requested: amount,
            staked: position.staked_amount,
        }),
        _ => Ok(()),
    }
}

fn check_pending_reward(kind: OperationKind, context: &ValidationContext) -> Result<(), ValidationError> {
    match &context.position {
        Some(position) if position.pending_reward.is_zero() => {
            Err(ValidationError::NothingToClaim(kind))
        }
        _ => Ok(()),
    }
}

fn check_minimum(minimum: U256, desired: U256) -> Result<(), ValidationError> {
    if minimum > desired {
        return Err(ValidationError::MinimumAboveDesired { minimum, desired });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use stakeflow_core::Address;

    use super::*;
    use crate::calls::LiquidityAmounts;

    fn stake(amount: u64) -> OperationParams {
        OperationParams::Stake {
            staking: Address::repeat_byte(2),
            pool_id: None,
            amount: U256::from(amount),
        }
    }

    fn bounded_pool() -> PoolParameters {
        PoolParameters {
            total_staked: U256::from(1_000_000),
            min_stake: U256::from(100),
            max_stake: U256::from(1_000),
            decimals: 18,
            ..Default::default()
        }
    }

    #[test]
    fn nothing_known_means_nothing_checked() {
        let context = ValidationContext::default();
        assert_eq!(validate(&stake(1), &context), Ok(()));
        let harvest = OperationParams::Harvest {
            staking: Address::zero(),
            pool_id: None,
        };
        assert_eq!(validate(&harvest, &context), Ok(()));
    }

    #[test]
    fn zero_amounts_are_refused() {
        assert_eq!(
            validate(&stake(0), &ValidationContext::default()),
            Err(ValidationError::ZeroAmount(OperationKind::Stake))
        );
        let approve = OperationParams::Approve {
            token: Address::zero(),
            spender: Address::zero(),
            amount: U256::zero(),
        };
        assert_eq!(
            validate(&approve, &ValidationContext::default()),
            Err(ValidationError::ZeroAmount(OperationKind::Approve))
        );
    }

    #[test]
    fn stake_respects_pool_bounds() {
        let context = ValidationContext {
            pool: Some(bounded_pool()),
            position: Some(UserPosition {
                staked_amount: U256::from(950),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            validate(&stake(99), &context),
            Err(ValidationError::BelowMinimum {
                amount: U256::from(99),
                minimum: U256::from(100)
            })
        );
        assert_eq!(
            validate(&stake(100), &context),
            Err(ValidationError::ExceedsMaximum {
                total: U256::from(1_050),
                maximum: U256::from(1_000)
            })
        );

        let context = ValidationContext {
            position: None,
            ..context
        };
        assert_eq!(validate(&stake(100), &context), Ok(()));
    }

    #[test]
    fn stake_needs_balance_then_allowance() {
        let context = ValidationContext {
            balance: Some(U256::from(50)),
            allowance: Some(U256::from(10)),
            ..Default::default()
        };
        assert_eq!(
            validate(&stake(60), &context),
            Err(ValidationError::InsufficientBalance {
                required: U256::from(60),
                available: U256::from(50)
            })
        );
        assert_eq!(
            validate(&stake(20), &context),
            Err(ValidationError::InsufficientAllowance {
                required: U256::from(20),
                available: U256::from(10)
            })
        );
        assert_eq!(validate(&stake(10), &context), Ok(()));
    }

    #[test]
    fn withdrawals_are_bounded_by_the_position() {
        let context = ValidationContext {
            // balance is irrelevant when withdrawing
            balance: Some(U256::zero()),
            position: Some(UserPosition {
                staked_amount: U256::from(300),
                ..Default::default()
            }),
            ..Default::default()
        };
        for params in [
            OperationParams::Unstake {
                staking: Address::zero(),
                pool_id: None,
                amount: U256::from(301),
            },
            OperationParams::EmergencyWithdraw {
                staking: Address::zero(),
                pool_id: Some(U256::one()),
                amount: U256::from(301),
            },
        ] {
            assert_eq!(
                validate(&params, &context),
                Err(ValidationError::ExceedsStaked {
                    requested: U256::from(301),
                    staked: U256::from(300)
                })
            );
        }
    }

    #[test]
    fn reward_kinds_need_something_to_claim() {
        let context = ValidationContext {
            position: Some(UserPosition::default()),
            ..Default::default()
        };
        let compound = OperationParams::Compound {
            staking: Address::zero(),
            pool_id: None,
        };
        assert_eq!(
            validate(&compound, &context),
            Err(ValidationError::NothingToClaim(OperationKind::Compound))
        );

        let context = ValidationContext {
            position: Some(UserPosition {
                pending_reward: U256::one(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(validate(&compound, &context), Ok(()));
    }

    #[test]
    fn liquidity_minimums_cannot_exceed_desired() {
        let params = OperationParams::AddLiquidity {
            router: Address::zero(),
            token_a: Address::zero(),
            token_b: None,
            amounts: LiquidityAmounts {
                amount_a_desired: U256::from(10),
                amount_b_desired: U256::from(10),
                amount_a_min: U256::from(5),
                amount_b_min: U256::from(11),
            },
        };
        assert_eq!(
            validate(&params, &ValidationContext::default()),
            Err(ValidationError::MinimumAboveDesired {
                minimum: U256::from(11),
                desired: U256::from(10)
            })
        );
    }

    #[test]
    fn liquidity_checks_both_sides() {
        let amounts = LiquidityAmounts::with_slippage(U256::from(100), U256::from(40), 50);
        let token_pair = OperationParams::AddLiquidity {
            router: Address::zero(),
            token_a: Address::repeat_byte(1),
            token_b: Some(Address::repeat_byte(2)),
            amounts,
        };
        let context = ValidationContext {
            balance: Some(U256::from(100)),
            allowance: Some(U256::from(100)),
            balance_b: Some(U256::from(40)),
            allowance_b: Some(U256::from(39)),
            ..Default::default()
        };
        assert_eq!(
            validate(&token_pair, &context),
            Err(ValidationError::InsufficientAllowance {
                required: U256::from(40),
                available: U256::from(39)
            })
        );

        // a native second side has no allowance to check
        let native_pair = OperationParams::AddLiquidity {
            router: Address::zero(),
            token_a: Address::repeat_byte(1),
            token_b: None,
            amounts,
        };
        assert_eq!(validate(&native_pair, &context), Ok(()));

        let context = ValidationContext {
            balance_b: Some(U256::from(30)),
            ..context
        };
        assert_eq!(
            validate(&native_pair, &context),
            Err(ValidationError::InsufficientBalance {
                required: U256::from(40),
                available: U256::from(30)
            })
        );
    }
}
