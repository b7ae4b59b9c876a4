//! Core types shared by the stakeflow operation dispatcher and the reward
//! calculator. Nothing in here touches the network.

// Forbid unsafe code outside of tests
#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

pub use ethers_core::types::{Address, H256, U256};

pub use calculator::CalculatorState;
pub use error::{CoreError, CoreResult};
pub use types::*;

/// Client-side reward projections
pub mod projection;

mod calculator;
mod error;
mod types;
