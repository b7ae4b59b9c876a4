use std::sync::Arc;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{transaction::eip2718::TypedTransaction, BlockNumber};
use eyre::Context;
use tracing::{debug, info};

use stakeflow_core::{Address, H256, U256};

use crate::LanderError;

use super::{LedgerProvider, LedgerSigner, ReceiptStatus};

/// Ledger access over HTTP with a local key
pub type HttpLedger = EthersLedger<SignerMiddleware<Provider<Http>, LocalWallet>>;

/// [`LedgerProvider`] and [`LedgerSigner`] over any ethers middleware stack.
/// The middleware must be able to sign for the accounts it is asked to send
/// from.
#[derive(Debug)]
pub struct EthersLedger<M> {
    client: Arc<M>,
}

impl<M> EthersLedger<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

impl<M> Clone for EthersLedger<M> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

/// Connect to `rpc_url`, signing with `private_key` for `chain_id`.
pub fn connect_http(rpc_url: &str, private_key: &str, chain_id: u64) -> eyre::Result<HttpLedger> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .with_context(|| format!("Invalid RPC url {rpc_url}"))?;
    let wallet = private_key
        .parse::<LocalWallet>()
        .context("Invalid signer key")?
        .with_chain_id(chain_id);
    info!(address = ?wallet.address(), chain_id, "Connected ledger signer");
    Ok(EthersLedger::new(Arc::new(SignerMiddleware::new(
        provider, wallet,
    ))))
}

#[async_trait]
impl<M> LedgerProvider for EthersLedger<M>
where
    M: Middleware + 'static,
{
    async fn pending_nonce(&self, account: Address) -> Result<U256, LanderError> {
        self.client
            .get_transaction_count(account, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|err| LanderError::ProviderError(err.to_string()))
    }

    async fn gas_price(&self) -> Result<U256, LanderError> {
        self.client
            .get_gas_price()
            .await
            .map_err(|err| LanderError::ProviderError(err.to_string()))
    }

    async fn receipt_status(&self, tx_hash: H256) -> Result<Option<ReceiptStatus>, LanderError> {
        let receipt = self
            .client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|err| LanderError::ProviderError(err.to_string()))?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };
        // some nodes hand out receipts for pending transactions
        if receipt.block_number.is_none() {
            debug!(?tx_hash, "Receipt has no block yet");
            return Ok(None);
        }
        let status = match receipt.status {
            Some(status) if status.is_zero() => ReceiptStatus::Reverted,
            _ => ReceiptStatus::Success,
        };
        Ok(Some(status))
    }
}

#[async_trait]
impl<M> LedgerSigner for EthersLedger<M>
where
    M: Middleware + 'static,
{
    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256, LanderError> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|err| LanderError::SignerError(err.to_string()))?;
        Ok(pending.tx_hash())
    }
}
