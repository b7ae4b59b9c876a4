use strum::Display;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use stakeflow_core::{Address, OperationKind};

/// Read-cache entries a confirmed operation can make stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CacheKey {
    Balance,
    Allowance,
    UserPosition,
    PendingReward,
    PoolParameters,
    LpBalance,
    SaleInfo,
}

/// Refetch request for `account`, sent after an operation of `kind`
/// succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationSignal {
    pub account: Address,
    pub kind: OperationKind,
    pub keys: Vec<CacheKey>,
}

/// Whatever owns the read-cache. Called once per succeeded operation.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, signal: InvalidationSignal);
}

/// Fans invalidation signals out to any number of cache refreshers.
#[derive(Debug, Clone)]
pub struct BroadcastInvalidator {
    sender: broadcast::Sender<InvalidationSignal>,
}

impl BroadcastInvalidator {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationSignal> {
        self.sender.subscribe()
    }
}

impl CacheInvalidator for BroadcastInvalidator {
    fn invalidate(&self, signal: InvalidationSignal) {
        debug!(account = ?signal.account, kind = %signal.kind, keys = ?signal.keys, "Invalidating cached reads");
        if self.sender.send(signal).is_err() {
            trace!("No cache refresher is listening");
        }
    }
}
