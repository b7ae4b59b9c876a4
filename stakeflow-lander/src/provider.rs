use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;

use stakeflow_core::{Address, H256, U256};

use crate::LanderError;

pub use self::evm::{connect_http, EthersLedger, HttpLedger};

mod evm;

/// Terminal status carried by a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Read-only calls the lifecycle needs from a node.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Next nonce for `account`, counting transactions still in the mempool
    async fn pending_nonce(&self, account: Address) -> Result<U256, LanderError>;

    /// Current network gas price, before any premium
    async fn gas_price(&self) -> Result<U256, LanderError>;

    /// `None` while the transaction is not included yet
    async fn receipt_status(&self, tx_hash: H256) -> Result<Option<ReceiptStatus>, LanderError>;
}

/// Hands fully specified transactions to the wallet for signing and
/// broadcast.
#[async_trait]
pub trait LedgerSigner: Send + Sync {
    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256, LanderError>;
}
