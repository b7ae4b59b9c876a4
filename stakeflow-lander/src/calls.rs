//! Per-kind call construction.
//!
//! Every write the product makes is one of a small set of contract calls.
//! [`OperationParams`] carries what the caller knows, [`build_call`] turns it
//! into calldata with deadlines stamped at construction time.

use chrono::{DateTime, Utc};
use ethers::abi::{self, Token};
use ethers::types::Bytes;
use ethers::utils::id;

use stakeflow_core::{Address, OperationKind, U256};

/// Window given to liquidity and contribute calls before the contract refuses
/// them.
pub const DEADLINE_WINDOW_SECS: u64 = 20 * 60;

const BPS_DENOMINATOR: u32 = 10_000;

/// Desired and minimum amounts for a liquidity call, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiquidityAmounts {
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
}

impl LiquidityAmounts {
    /// Minimums derived from the desired amounts with `slippage_bps` of
    /// tolerance (50 = 0.5%). Tolerances above 100% are clamped.
    pub fn with_slippage(amount_a_desired: U256, amount_b_desired: U256, slippage_bps: u32) -> Self {
        let keep = U256::from(BPS_DENOMINATOR.saturating_sub(slippage_bps.min(BPS_DENOMINATOR)));
        let denominator = U256::from(BPS_DENOMINATOR);
        Self {
            amount_a_desired,
            amount_b_desired,
            amount_a_min: amount_a_desired.saturating_mul(keep).div_mod(denominator).0,
            amount_b_min: amount_b_desired.saturating_mul(keep).div_mod(denominator).0,
        }
    }
}

/// What the caller supplies for each kind of write. `pool_id` selects the
/// multi-pool form of the staking calls; `None` targets a single-pool
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationParams {
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Stake {
        staking: Address,
        pool_id: Option<U256>,
        amount: U256,
    },
    Unstake {
        staking: Address,
        pool_id: Option<U256>,
        amount: U256,
    },
    Harvest {
        staking: Address,
        pool_id: Option<U256>,
    },
    Compound {
        staking: Address,
        pool_id: Option<U256>,
    },
    /// `token_b: None` pairs `token_a` with the native asset
    AddLiquidity {
        router: Address,
        token_a: Address,
        token_b: Option<Address>,
        amounts: LiquidityAmounts,
    },
    /// `token_b: None` pairs `token_a` with the native asset
    RemoveLiquidity {
        router: Address,
        token_a: Address,
        token_b: Option<Address>,
        liquidity: U256,
        amount_a_min: U256,
        amount_b_min: U256,
    },
    Contribute {
        launchpad: Address,
        sale_id: U256,
        amount: U256,
        /// pay in the native asset instead of the sale's token
        native: bool,
    },
    /// `amount` is what the caller expects to withdraw; the contract takes
    /// the whole position
    EmergencyWithdraw {
        staking: Address,
        pool_id: Option<U256>,
        amount: U256,
    },
}

impl OperationParams {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParams::Approve { .. } => OperationKind::Approve,
            OperationParams::Stake { .. } => OperationKind::Stake,
            OperationParams::Unstake { .. } => OperationKind::Unstake,
            OperationParams::Harvest { .. } => OperationKind::Harvest,
            OperationParams::Compound { .. } => OperationKind::Compound,
            OperationParams::AddLiquidity { .. } => OperationKind::AddLiquidity,
            OperationParams::RemoveLiquidity { .. } => OperationKind::RemoveLiquidity,
            OperationParams::Contribute { .. } => OperationKind::Contribute,
            OperationParams::EmergencyWithdraw { .. } => OperationKind::EmergencyWithdraw,
        }
    }

    /// Amount checked against balances and bounds. For liquidity calls this
    /// is the `token_a` side or the LP amount being burnt.
    pub fn amount(&self) -> Option<U256> {
        match self {
            OperationParams::Approve { amount, .. }
            | OperationParams::Stake { amount, .. }
            | OperationParams::Unstake { amount, .. }
            | OperationParams::Contribute { amount, .. }
            | OperationParams::EmergencyWithdraw { amount, .. } => Some(*amount),
            OperationParams::AddLiquidity { amounts, .. } => Some(amounts.amount_a_desired),
            OperationParams::RemoveLiquidity { liquidity, .. } => Some(*liquidity),
            OperationParams::Harvest { .. } | OperationParams::Compound { .. } => None,
        }
    }

    /// Contract and function the call resolves to
    pub fn target(&self) -> OperationTarget {
        let (contract, signature) = match self {
            OperationParams::Approve { token, .. } => (*token, "approve(address,uint256)"),
            OperationParams::Stake {
                staking, pool_id, ..
            } => (
                *staking,
                pool_variant(pool_id, "deposit(uint256,uint256)", "stake(uint256)"),
            ),
            OperationParams::Unstake {
                staking, pool_id, ..
            } => (
                *staking,
                pool_variant(pool_id, "withdraw(uint256,uint256)", "unstake(uint256)"),
            ),
            OperationParams::Harvest { staking, pool_id } => (
                *staking,
                pool_variant(pool_id, "harvest(uint256)", "harvest()"),
            ),
            OperationParams::Compound { staking, pool_id } => (
                *staking,
                pool_variant(pool_id, "compound(uint256)", "compound()"),
            ),
            OperationParams::AddLiquidity {
                router, token_b, ..
            } => match token_b {
                Some(_) => (
                    *router,
                    "addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)",
                ),
                None => (
                    *router,
                    "addLiquidityETH(address,uint256,uint256,uint256,address,uint256)",
                ),
            },
            OperationParams::RemoveLiquidity {
                router, token_b, ..
            } => match token_b {
                Some(_) => (
                    *router,
                    "removeLiquidity(address,address,uint256,uint256,uint256,address,uint256)",
                ),
                None => (
                    *router,
                    "removeLiquidityETH(address,uint256,uint256,uint256,address,uint256)",
                ),
            },
            OperationParams::Contribute {
                launchpad, native, ..
            } => {
                if *native {
                    (*launchpad, "contribute(uint256)")
                } else {
                    (*launchpad, "contribute(uint256,uint256)")
                }
            }
            OperationParams::EmergencyWithdraw {
                staking, pool_id, ..
            } => (
                *staking,
                pool_variant(pool_id, "emergencyWithdraw(uint256)", "emergencyWithdraw()"),
            ),
        };
        OperationTarget {
            contract,
            signature,
        }
    }
}

fn pool_variant(
    pool_id: &Option<U256>,
    with_pool: &'static str,
    without_pool: &'static str,
) -> &'static str {
    if pool_id.is_some() {
        with_pool
    } else {
        without_pool
    }
}

/// Contract plus function signature an operation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationTarget {
    pub contract: Address,
    pub signature: &'static str,
}

impl OperationTarget {
    /// 4 byte function selector
    pub fn selector(&self) -> [u8; 4] {
        id(self.signature)
    }
}

/// Encoded call, ready to be wrapped into a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    pub target: OperationTarget,
    pub data: Bytes,
    /// native value sent along
    pub value: U256,
}

/// Encode `params` for a call from `from`. Deadlines are `now` plus
/// [`DEADLINE_WINDOW_SECS`].
pub fn build_call(params: &OperationParams, from: Address, now: DateTime<Utc>) -> CallData {
    let target = params.target();
    let deadline = Token::Uint(deadline_from(now));
    let uint = |value: &U256| Token::Uint(*value);
    let pool_prefixed = |pool_id: &Option<U256>, mut rest: Vec<Token>| {
        if let Some(pool_id) = pool_id {
            rest.insert(0, Token::Uint(*pool_id));
        }
        rest
    };

    let (tokens, value) = match params {
        OperationParams::Approve {
            spender, amount, ..
        } => (vec![Token::Address(*spender), uint(amount)], U256::zero()),
        OperationParams::Stake {
            pool_id, amount, ..
        }
        | OperationParams::Unstake {
            pool_id, amount, ..
        } => (pool_prefixed(pool_id, vec![uint(amount)]), U256::zero()),
        OperationParams::Harvest { pool_id, .. }
        | OperationParams::Compound { pool_id, .. }
        | OperationParams::EmergencyWithdraw { pool_id, .. } => {
            (pool_prefixed(pool_id, vec![]), U256::zero())
        }
        OperationParams::AddLiquidity {
            token_a,
            token_b: Some(token_b),
            amounts,
            ..
        } => (
            vec![
                Token::Address(*token_a),
                Token::Address(*token_b),
                uint(&amounts.amount_a_desired),
                uint(&amounts.amount_b_desired),
                uint(&amounts.amount_a_min),
                uint(&amounts.amount_b_min),
                Token::Address(from),
                deadline,
            ],
            U256::zero(),
        ),
        OperationParams::AddLiquidity {
            token_a,
            token_b: None,
            amounts,
            ..
        } => (
            vec![
                Token::Address(*token_a),
                uint(&amounts.amount_a_desired),
                uint(&amounts.amount_a_min),
                uint(&amounts.amount_b_min),
                Token::Address(from),
                deadline,
            ],
            amounts.amount_b_desired,
        ),
        OperationParams::RemoveLiquidity {
            token_a,
            token_b: Some(token_b),
            liquidity,
            amount_a_min,
            amount_b_min,
            ..
        } => (
            vec![
                Token::Address(*token_a),
                Token::Address(*token_b),
                uint(liquidity),
                uint(amount_a_min),
                uint(amount_b_min),
                Token::Address(from),
                deadline,
            ],
            U256::zero(),
        ),
        OperationParams::RemoveLiquidity {
            token_a,
            token_b: None,
            liquidity,
            amount_a_min,
            amount_b_min,
            ..
        } => (
            vec![
                Token::Address(*token_a),
                uint(liquidity),
                uint(amount_a_min),
                uint(amount_b_min),
                Token::Address(from),
                deadline,
            ],
            U256::zero(),
        ),
        OperationParams::Contribute {
            sale_id,
            amount,
            native: true,
            ..
        } => (vec![uint(sale_id)], *amount),
        OperationParams::Contribute {
            sale_id,
            amount,
            native: false,
            ..
        } => (vec![uint(sale_id), uint(amount)], U256::zero()),
    };

    let mut data = target.selector().to_vec();
    data.extend(abi::encode(&tokens));
    CallData {
        target,
        data: data.into(),
        value,
    }
}

fn deadline_from(now: DateTime<Utc>) -> U256 {
    let now = u64::try_from(now.timestamp()).unwrap_or_default();
    U256::from(now.saturating_add(DEADLINE_WINDOW_SECS))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ethers::abi::ParamType;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).unwrap()
    }

    fn decode(call: &CallData, types: &[ParamType]) -> Vec<Token> {
        assert_eq!(&call.data[..4], &call.target.selector());
        abi::decode(types, &call.data[4..]).unwrap()
    }

    #[test]
    fn slippage_derives_minimums() {
        let amounts =
            LiquidityAmounts::with_slippage(U256::from(10_000), U256::from(2_000), 50);
        assert_eq!(amounts.amount_a_min, U256::from(9_950));
        assert_eq!(amounts.amount_b_min, U256::from(1_990));

        let amounts = LiquidityAmounts::with_slippage(U256::from(10_000), U256::from(1), 20_000);
        assert_eq!(amounts.amount_a_min, U256::zero());
        assert_eq!(amounts.amount_b_desired, U256::from(1));
    }

    #[test]
    fn approve_encodes_spender_and_amount() {
        let spender = Address::repeat_byte(0xaa);
        let params = OperationParams::Approve {
            token: Address::repeat_byte(0x01),
            spender,
            amount: U256::from(5),
        };
        let call = build_call(&params, Address::zero(), now());

        assert_eq!(call.target.contract, Address::repeat_byte(0x01));
        // keccak("approve(address,uint256)")[..4]
        assert_eq!(call.target.selector(), [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(
            decode(&call, &[ParamType::Address, ParamType::Uint(256)]),
            vec![Token::Address(spender), Token::Uint(U256::from(5))]
        );
        assert!(call.value.is_zero());
    }

    #[test]
    fn staking_calls_pick_pool_form() {
        let staking = Address::repeat_byte(0x02);
        let single = OperationParams::Stake {
            staking,
            pool_id: None,
            amount: U256::from(7),
        };
        let multi = OperationParams::Stake {
            staking,
            pool_id: Some(U256::from(3)),
            amount: U256::from(7),
        };

        let call = build_call(&single, Address::zero(), now());
        assert_eq!(call.target.signature, "stake(uint256)");
        assert_eq!(
            decode(&call, &[ParamType::Uint(256)]),
            vec![Token::Uint(U256::from(7))]
        );

        let call = build_call(&multi, Address::zero(), now());
        assert_eq!(call.target.signature, "deposit(uint256,uint256)");
        assert_eq!(
            decode(&call, &[ParamType::Uint(256), ParamType::Uint(256)]),
            vec![Token::Uint(U256::from(3)), Token::Uint(U256::from(7))]
        );
    }

    #[test]
    fn reward_calls_carry_no_amount() {
        let params = OperationParams::Harvest {
            staking: Address::repeat_byte(0x02),
            pool_id: None,
        };
        let call = build_call(&params, Address::zero(), now());
        assert_eq!(call.target.signature, "harvest()");
        assert_eq!(call.data.len(), 4);
        assert_eq!(params.amount(), None);

        let params = OperationParams::Compound {
            staking: Address::repeat_byte(0x02),
            pool_id: Some(U256::one()),
        };
        let call = build_call(&params, Address::zero(), now());
        assert_eq!(call.data.len(), 4 + 32);
    }

    #[test]
    fn add_liquidity_stamps_recipient_and_deadline() {
        let from = Address::repeat_byte(0xfe);
        let amounts = LiquidityAmounts::with_slippage(U256::from(1_000), U256::from(500), 100);
        let params = OperationParams::AddLiquidity {
            router: Address::repeat_byte(0x03),
            token_a: Address::repeat_byte(0x0a),
            token_b: Some(Address::repeat_byte(0x0b)),
            amounts,
        };
        let call = build_call(&params, from, now());

        let tokens = decode(
            &call,
            &[
                ParamType::Address,
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Address,
                ParamType::Uint(256),
            ],
        );
        assert_eq!(tokens[4], Token::Uint(U256::from(990)));
        assert_eq!(tokens[5], Token::Uint(U256::from(495)));
        assert_eq!(tokens[6], Token::Address(from));
        assert_eq!(tokens[7], Token::Uint(U256::from((NOW as u64).saturating_add(DEADLINE_WINDOW_SECS))));
        assert!(call.value.is_zero());
    }

    #[test]
    fn native_liquidity_sends_value() {
        let amounts = LiquidityAmounts::with_slippage(U256::from(1_000), U256::from(500), 0);
        let params = OperationParams::AddLiquidity {
            router: Address::repeat_byte(0x03),
            token_a: Address::repeat_byte(0x0a),
            token_b: None,
            amounts,
        };
        let call = build_call(&params, Address::zero(), now());
        assert_eq!(
            call.target.signature,
            "addLiquidityETH(address,uint256,uint256,uint256,address,uint256)"
        );
        assert_eq!(call.value, U256::from(500));

        let params = OperationParams::RemoveLiquidity {
            router: Address::repeat_byte(0x03),
            token_a: Address::repeat_byte(0x0a),
            token_b: None,
            liquidity: U256::from(42),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
        };
        let call = build_call(&params, Address::zero(), now());
        assert!(call.target.signature.starts_with("removeLiquidityETH("));
        assert_eq!(params.amount(), Some(U256::from(42)));
        assert!(call.value.is_zero());
    }

    #[test]
    fn native_contribution_moves_amount_into_value() {
        let params = OperationParams::Contribute {
            launchpad: Address::repeat_byte(0x04),
            sale_id: U256::from(9),
            amount: U256::from(1_000),
            native: true,
        };
        let call = build_call(&params, Address::zero(), now());
        assert_eq!(call.value, U256::from(1_000));
        assert_eq!(
            decode(&call, &[ParamType::Uint(256)]),
            vec![Token::Uint(U256::from(9))]
        );

        let params = OperationParams::Contribute {
            launchpad: Address::repeat_byte(0x04),
            sale_id: U256::from(9),
            amount: U256::from(1_000),
            native: false,
        };
        let call = build_call(&params, Address::zero(), now());
        assert!(call.value.is_zero());
        assert_eq!(call.target.signature, "contribute(uint256,uint256)");
    }
}
