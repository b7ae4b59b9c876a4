use std::sync::Arc;

use ethers::types::{transaction::eip2718::TypedTransaction, TransactionRequest};
use tracing::{info, warn};

use stakeflow_core::{Address, H256, U256};

use crate::calls::CallData;
use crate::classifier::classify_submission;
use crate::provider::LedgerSigner;
use crate::OperationError;

/// Gas and ordering fields every submission sets explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionParams {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
}

/// Wraps calldata into a fully specified legacy transaction and hands it to
/// the signer. Nothing is left for the wallet to fill in.
pub struct TransactionSubmitter {
    signer: Arc<dyn LedgerSigner>,
    chain_id: u64,
}

impl TransactionSubmitter {
    pub fn new(signer: Arc<dyn LedgerSigner>, chain_id: u64) -> Self {
        Self { signer, chain_id }
    }

    pub async fn submit(
        &self,
        from: Address,
        call: &CallData,
        params: SubmissionParams,
    ) -> Result<H256, OperationError> {
        let tx = self.transaction(from, call, params);
        info!(
            to = ?call.target.contract,
            signature = call.target.signature,
            nonce = params.nonce.to_string(),
            gas_price = params.gas_price.to_string(),
            gas_limit = params.gas_limit.to_string(),
            "Dispatching transaction"
        );

        match self.signer.send_transaction(tx).await {
            Ok(tx_hash) => {
                info!(?tx_hash, "Dispatched tx");
                Ok(tx_hash)
            }
            Err(err) => {
                let error = classify_submission(&err.raw_message());
                warn!(error = %err, classified = ?error, "Signer refused transaction");
                Err(error)
            }
        }
    }

    fn transaction(&self, from: Address, call: &CallData, params: SubmissionParams) -> TypedTransaction {
        TransactionRequest::new()
            .from(from)
            .to(call.target.contract)
            .data(call.data.clone())
            .value(call.value)
            .nonce(params.nonce)
            .gas(params.gas_limit)
            .gas_price(params.gas_price)
            .chain_id(self.chain_id)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::calls::{build_call, OperationParams};
    use crate::tests::test_utils::MockSigner;
    use crate::LanderError;

    fn call() -> CallData {
        let params = OperationParams::Stake {
            staking: Address::repeat_byte(2),
            pool_id: None,
            amount: U256::from(10),
        };
        build_call(&params, Address::repeat_byte(1), Utc::now())
    }

    fn params() -> SubmissionParams {
        SubmissionParams {
            nonce: U256::from(4),
            gas_price: U256::from(130),
            gas_limit: U256::from(300_000),
        }
    }

    #[tokio::test]
    async fn sets_every_field_explicitly() {
        let expected_call = call();
        let expected_data = expected_call.data.clone();
        let mut signer = MockSigner::new();
        signer
            .expect_send_transaction()
            .times(1)
            .withf(move |tx| {
                tx.from() == Some(&Address::repeat_byte(1))
                    && tx.to_addr() == Some(&Address::repeat_byte(2))
                    && tx.nonce() == Some(&U256::from(4))
                    && tx.gas() == Some(&U256::from(300_000))
                    && tx.gas_price() == Some(U256::from(130))
                    && tx.chain_id() == Some(5u64.into())
                    && tx.data() == Some(&expected_data)
            })
            .returning(|_| Ok(H256::repeat_byte(9)));
        let submitter = TransactionSubmitter::new(Arc::new(signer), 5);

        let hash = submitter
            .submit(Address::repeat_byte(1), &expected_call, params())
            .await
            .unwrap();
        assert_eq!(hash, H256::repeat_byte(9));
    }

    #[tokio::test]
    async fn wallet_refusal_is_user_rejected() {
        let mut signer = MockSigner::new();
        signer.expect_send_transaction().returning(|_| {
            Err(LanderError::SignerError(
                "MetaMask Tx Signature: User denied transaction signature.".into(),
            ))
        });
        let submitter = TransactionSubmitter::new(Arc::new(signer), 5);

        let err = submitter
            .submit(Address::repeat_byte(1), &call(), params())
            .await
            .unwrap_err();
        assert_eq!(err, OperationError::UserRejected);
    }

    #[tokio::test]
    async fn other_faults_are_submission_errors() {
        let mut signer = MockSigner::new();
        signer
            .expect_send_transaction()
            .returning(|_| Err(LanderError::SignerError("nonce too low".into())));
        let submitter = TransactionSubmitter::new(Arc::new(signer), 5);

        let err = submitter
            .submit(Address::repeat_byte(1), &call(), params())
            .await
            .unwrap_err();
        assert_eq!(err, OperationError::SubmissionError("nonce too low".into()));
    }

    #[tokio::test]
    async fn gas_funding_shortfall_is_a_submission_error() {
        const RAW: &str = "insufficient funds for gas * price + value";
        let mut signer = MockSigner::new();
        signer
            .expect_send_transaction()
            .returning(|_| Err(LanderError::SignerError(RAW.into())));
        let submitter = TransactionSubmitter::new(Arc::new(signer), 5);

        let err = submitter
            .submit(Address::repeat_byte(1), &call(), params())
            .await
            .unwrap_err();
        assert_eq!(err, OperationError::SubmissionError(RAW.into()));
    }
}
