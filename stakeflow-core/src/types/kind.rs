use strum::{Display, EnumIter, EnumString};

/// Every mutating action the product can submit to the ledger.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    /// ERC20 allowance grant
    Approve,
    /// Deposit into a staking pool
    Stake,
    /// Withdraw from a staking pool
    Unstake,
    /// Claim pending rewards
    Harvest,
    /// Re-stake pending rewards
    Compound,
    /// Provide liquidity to an AMM pair
    AddLiquidity,
    /// Burn LP tokens for the underlying pair
    RemoveLiquidity,
    /// Contribute to a launchpad sale
    Contribute,
    /// Withdraw ignoring rewards, paying the pool's penalty
    EmergencyWithdraw,
}

impl OperationKind {
    /// Harvest and Compound act on the pending reward and never carry an amount.
    pub fn carries_amount(&self) -> bool {
        !matches!(self, OperationKind::Harvest | OperationKind::Compound)
    }

    /// Kinds that move tokens out of the account and therefore need an allowance
    /// for the target contract when the asset is not native.
    pub fn spends_allowance(&self) -> bool {
        matches!(
            self,
            OperationKind::Stake
                | OperationKind::AddLiquidity
                | OperationKind::RemoveLiquidity
                | OperationKind::Contribute
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::OperationKind;

    #[test]
    fn only_reward_kinds_carry_no_amount() {
        let amountless: Vec<_> = OperationKind::iter()
            .filter(|kind| !kind.carries_amount())
            .collect();
        assert_eq!(
            amountless,
            vec![OperationKind::Harvest, OperationKind::Compound]
        );
    }

    #[test]
    fn kind_names_match_config_keys() {
        assert_eq!(OperationKind::AddLiquidity.to_string(), "add_liquidity");
        assert_eq!(
            OperationKind::from_str("emergency_withdraw").unwrap(),
            OperationKind::EmergencyWithdraw
        );
        let json = serde_json::to_string(&OperationKind::RemoveLiquidity).unwrap();
        assert_eq!(json, "\"remove_liquidity\"");
    }
}
