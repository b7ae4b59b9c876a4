use std::sync::Arc;

use tracing::{debug, warn};

use stakeflow_core::U256;

use crate::provider::LedgerProvider;
use crate::OperationError;

const PREMIUM_MULTIPLIER_NUMERATOR: u32 = 130;
const PREMIUM_MULTIPLIER_DENOMINATOR: u32 = 100;

/// Network gas price plus a fixed 30% premium, so the transaction does not
/// sit in the mempool when blocks fill up.
pub struct GasPricer {
    provider: Arc<dyn LedgerProvider>,
}

impl GasPricer {
    pub fn new(provider: Arc<dyn LedgerProvider>) -> Self {
        Self { provider }
    }

    pub async fn current_premium_gas_price(&self) -> Result<U256, OperationError> {
        let network_price = self.provider.gas_price().await.map_err(|err| {
            warn!(error = %err, "Failed to read network gas price");
            OperationError::NetworkUnavailable(err.raw_message())
        })?;
        let premium_price = apply_premium(&network_price);
        debug!(?network_price, ?premium_price, "Applied gas price premium");
        Ok(premium_price)
    }
}

fn apply_premium(gas_price: &U256) -> U256 {
    let numerator = U256::from(PREMIUM_MULTIPLIER_NUMERATOR);
    let denominator = U256::from(PREMIUM_MULTIPLIER_DENOMINATOR);
    gas_price.saturating_mul(numerator).div_mod(denominator).0
}
