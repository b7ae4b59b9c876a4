use std::sync::Arc;

use tracing::{info, warn};

use stakeflow_core::{Address, U256};

use crate::provider::LedgerProvider;
use crate::OperationError;

/// Hands out nonces straight from the node's pending view.
///
/// Nothing is cached between calls: other operations for the same account
/// may land in between, so every submission re-reads the pending nonce.
pub struct NonceAllocator {
    provider: Arc<dyn LedgerProvider>,
}

impl NonceAllocator {
    pub fn new(provider: Arc<dyn LedgerProvider>) -> Self {
        Self { provider }
    }

    pub async fn next_nonce(&self, account: Address) -> Result<U256, OperationError> {
        let nonce = self
            .provider
            .pending_nonce(account)
            .await
            .map_err(|err| {
                warn!(?account, error = %err, "Failed to read pending nonce");
                OperationError::NetworkUnavailable(err.raw_message())
            })?;
        info!(nonce = nonce.to_string(), ?account, "Allocated pending nonce");
        Ok(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_utils::MockLedger;
    use crate::LanderError;

    #[tokio::test]
    async fn reads_pending_nonce_every_time() {
        let mut provider = MockLedger::new();
        let mut counter = 0u64;
        provider
            .expect_pending_nonce()
            .times(2)
            .returning(move |_| {
                counter = counter.saturating_add(1);
                Ok(U256::from(6).saturating_add(U256::from(counter)))
            });
        let allocator = NonceAllocator::new(Arc::new(provider));

        let account = Address::repeat_byte(1);
        assert_eq!(allocator.next_nonce(account).await.unwrap(), U256::from(7));
        assert_eq!(allocator.next_nonce(account).await.unwrap(), U256::from(8));
    }

    #[tokio::test]
    async fn read_failure_is_network_unavailable() {
        let mut provider = MockLedger::new();
        provider
            .expect_pending_nonce()
            .returning(|_| Err(LanderError::ProviderError("connection refused".into())));
        let allocator = NonceAllocator::new(Arc::new(provider));

        let err = allocator
            .next_nonce(Address::zero())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OperationError::NetworkUnavailable("connection refused".into())
        );
    }
}
