use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use stakeflow_core::H256;

use crate::metrics::DispatcherMetrics;
use crate::provider::{LedgerProvider, ReceiptStatus};

/// How waiting on a submitted transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Success,
    Reverted,
    /// No receipt before the deadline. Says nothing about the on-chain fate.
    TimedOut,
    /// The consumer is gone; nothing should be reported
    Cancelled,
}

/// Polls for a receipt at a fixed interval until it shows up, the timeout
/// elapses or the consumer cancels.
pub struct ReceiptPoller {
    provider: Arc<dyn LedgerProvider>,
    interval: Duration,
    metrics: DispatcherMetrics,
}

impl ReceiptPoller {
    pub fn new(
        provider: Arc<dyn LedgerProvider>,
        interval: Duration,
        metrics: DispatcherMetrics,
    ) -> Self {
        Self {
            provider,
            interval,
            metrics,
        }
    }

    pub async fn await_outcome(
        &self,
        tx_hash: H256,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let polling = tokio::time::timeout(timeout, self.poll_until_terminal(tx_hash));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(?tx_hash, "Stopped polling, consumer cancelled");
                PollOutcome::Cancelled
            }
            outcome = polling => match outcome {
                Ok(ReceiptStatus::Success) => {
                    info!(?tx_hash, "confirmed transaction");
                    PollOutcome::Success
                }
                Ok(ReceiptStatus::Reverted) => {
                    warn!(?tx_hash, "transaction reverted");
                    PollOutcome::Reverted
                }
                Err(_) => {
                    warn!(?tx_hash, ?timeout, "waiting for receipt timed out");
                    PollOutcome::TimedOut
                }
            },
        }
    }

    async fn poll_until_terminal(&self, tx_hash: H256) -> ReceiptStatus {
        loop {
            self.metrics.receipt_polls.inc();
            match self.provider.receipt_status(tx_hash).await {
                Ok(Some(status)) => return status,
                Ok(None) => trace!(?tx_hash, "No receipt yet"),
                Err(err) => {
                    self.metrics.transient_poll_errors.inc();
                    warn!(?tx_hash, error = %err, "Failed to query receipt, retrying");
                }
            }
            sleep(self.interval).await;
        }
    }
}
