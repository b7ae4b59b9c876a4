use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use derive_new::new;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, trace, warn};

use stakeflow_core::{Address, OperationKind};

use crate::cache::{CacheInvalidator, InvalidationSignal};
use crate::calls::{build_call, OperationParams, OperationTarget};
use crate::gas_price::GasPricer;
use crate::kinds::{KindConfig, KindTable};
use crate::metrics::DispatcherMetrics;
use crate::nonce::NonceAllocator;
use crate::operation::{Operation, OperationReport, OperationState, OperationUpdate};
use crate::poller::{PollOutcome, ReceiptPoller};
use crate::provider::{LedgerProvider, LedgerSigner};
use crate::settings::DispatcherSettings;
use crate::submitter::{SubmissionParams, TransactionSubmitter};
use crate::validation::{validate, ValidationContext};
use crate::OperationError;

/// A write the caller wants performed, with the read-cache snapshot it should
/// be validated against.
#[derive(Debug, Clone, new)]
pub struct OperationRequest {
    pub account: Address,
    pub params: OperationParams,
    #[new(default)]
    pub context: ValidationContext,
}

impl OperationRequest {
    pub fn with_context(mut self, context: ValidationContext) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FlightKey {
    kind: OperationKind,
    account: Address,
    target: OperationTarget,
}

/// Holds a slot in the in-flight set until dropped, including when the
/// `begin` future itself is dropped half way.
struct FlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<FlightKey>>,
    key: FlightKey,
}

impl<'a> FlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<FlightKey>>, key: FlightKey) -> Option<Self> {
        if !in_flight.lock().insert(key.clone()) {
            return None;
        }
        Some(Self { in_flight, key })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

/// The consumer went away; the operation is abandoned without a report.
struct Abandoned;

/// Drives every write operation through
/// `Idle -> Preparing -> AwaitingSignature -> Submitted -> Confirming`
/// and into one of `Succeeded`, `Failed` or `TimedOut`.
///
/// Every kind of operation goes through the same lifecycle; what differs per
/// kind lives in [`KindTable`] and in the call built from
/// [`OperationParams`].
pub struct OperationStateMachine {
    nonces: NonceAllocator,
    gas_pricer: GasPricer,
    submitter: TransactionSubmitter,
    poller: ReceiptPoller,
    kinds: KindTable,
    invalidator: Arc<dyn CacheInvalidator>,
    in_flight: Mutex<HashSet<FlightKey>>,
    history: Mutex<VecDeque<OperationReport>>,
    history_limit: usize,
    updates: broadcast::Sender<OperationUpdate>,
    metrics: DispatcherMetrics,
}

impl OperationStateMachine {
    pub fn new(
        provider: Arc<dyn LedgerProvider>,
        signer: Arc<dyn LedgerSigner>,
        invalidator: Arc<dyn CacheInvalidator>,
        settings: &DispatcherSettings,
        metrics: DispatcherMetrics,
    ) -> Self {
        let (updates, _) = broadcast::channel(settings.update_capacity.max(1));
        Self {
            nonces: NonceAllocator::new(provider.clone()),
            gas_pricer: GasPricer::new(provider.clone()),
            submitter: TransactionSubmitter::new(signer, settings.chain_id),
            poller: ReceiptPoller::new(provider, settings.poll_interval(), metrics.clone()),
            kinds: KindTable::new(&settings.kinds),
            invalidator,
            in_flight: Mutex::new(HashSet::new()),
            history: Mutex::new(VecDeque::new()),
            history_limit: settings.history_limit,
            updates,
            metrics,
        }
    }

    /// Stream of state transitions for every operation started afterwards
    pub fn subscribe(&self) -> broadcast::Receiver<OperationUpdate> {
        self.updates.subscribe()
    }

    /// Finished operations, oldest first
    pub fn history(&self) -> Vec<OperationReport> {
        self.history.lock().iter().cloned().collect()
    }

    /// Number of operations not yet in a terminal state
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Run one operation to a terminal state.
    ///
    /// Returns `Err` only when the operation never got going
    /// ([`OperationError::AlreadyInProgress`]) or was abandoned through
    /// `cancel` ([`OperationError::Cancelled`]). Every other outcome,
    /// failures included, is an `Ok` report.
    #[instrument(skip_all, fields(kind = %request.params.kind(), account = ?request.account))]
    pub async fn begin(
        &self,
        request: OperationRequest,
        cancel: CancellationToken,
    ) -> Result<OperationReport, OperationError> {
        let kind = request.params.kind();
        let target = request.params.target();
        let key = FlightKey {
            kind,
            account: request.account,
            target,
        };
        let Some(_guard) = FlightGuard::acquire(&self.in_flight, key) else {
            warn!(?target, "Operation of this kind already in flight for this account");
            return Err(OperationError::AlreadyInProgress);
        };

        let config = self.kinds.get(kind);
        let mut operation = Operation::new(kind, request.account, request.params.amount(), target);
        self.metrics.update_started_metric(kind);
        info!(
            uuid = %operation.uuid,
            contract = ?target.contract,
            signature = target.signature,
            amount = ?operation.amount,
            "Starting operation"
        );

        if self
            .run(&mut operation, &request, &config, &cancel)
            .await
            .is_err()
        {
            self.metrics.update_abandoned_metric(kind);
            info!(
                uuid = %operation.uuid,
                state = %operation.state(),
                tx_hash = ?operation.tx_hash(),
                "Operation abandoned by its consumer"
            );
            return Err(OperationError::Cancelled);
        }

        let report = operation.report();
        self.metrics.update_finished_metric(kind, report.state);
        if let Some(error) = &report.error {
            self.metrics.update_error_metric(kind, error.label());
        }
        info!(uuid = %report.uuid, state = %report.state, message = report.message(), "Operation finished");
        self.archive(report.clone());
        Ok(report)
    }

    async fn run(
        &self,
        operation: &mut Operation,
        request: &OperationRequest,
        config: &KindConfig,
        cancel: &CancellationToken,
    ) -> Result<(), Abandoned> {
        self.advance(operation, OperationState::Preparing, cancel);
        if let Err(err) = validate(&request.params, &request.context) {
            warn!(uuid = %operation.uuid, error = %err, "Operation refused before submission");
            self.fail(operation, err.into(), cancel);
            return Ok(());
        }
        self.warn_on_lock_extension(operation, &request.context);

        let call = build_call(&request.params, request.account, Utc::now());
        let submission = match self.resolve_submission(request.account, config).await {
            Ok(submission) => submission,
            Err(err) => {
                self.fail(operation, err, cancel);
                return Ok(());
            }
        };
        if cancel.is_cancelled() {
            return Err(Abandoned);
        }

        self.advance(operation, OperationState::AwaitingSignature, cancel);
        let tx_hash = match self
            .submitter
            .submit(request.account, &call, submission)
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                self.fail(operation, err, cancel);
                return Ok(());
            }
        };
        operation.record_tx_hash(tx_hash);
        self.advance(operation, OperationState::Submitted, cancel);

        operation.deadline = chrono::Duration::from_std(config.timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_add_signed(timeout));
        self.advance(operation, OperationState::Confirming, cancel);

        match self
            .poller
            .await_outcome(tx_hash, config.timeout, cancel)
            .await
        {
            PollOutcome::Success => {
                self.advance(operation, OperationState::Succeeded, cancel);
                self.invalidate(operation, config);
            }
            PollOutcome::Reverted => self.fail(
                operation,
                OperationError::ContractRevert("transaction reverted".to_owned()),
                cancel,
            ),
            PollOutcome::TimedOut => self.advance(operation, OperationState::TimedOut, cancel),
            PollOutcome::Cancelled => return Err(Abandoned),
        }
        Ok(())
    }

    // gas price first: a failed read then costs no nonce
    async fn resolve_submission(
        &self,
        account: Address,
        config: &KindConfig,
    ) -> Result<SubmissionParams, OperationError> {
        let gas_price = self.gas_pricer.current_premium_gas_price().await?;
        self.metrics.update_gas_price_metric(gas_price);
        let nonce = self.nonces.next_nonce(account).await?;
        Ok(SubmissionParams {
            nonce,
            gas_price,
            gas_limit: config.gas_limit,
        })
    }

    fn advance(&self, operation: &mut Operation, next: OperationState, cancel: &CancellationToken) {
        if let Some(previous) = operation.transition(next) {
            self.publish(operation, previous, cancel);
        }
    }

    fn fail(&self, operation: &mut Operation, error: OperationError, cancel: &CancellationToken) {
        if let Some(previous) = operation.fail(error) {
            self.publish(operation, previous, cancel);
        }
    }

    fn publish(&self, operation: &Operation, previous: OperationState, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        let update = OperationUpdate {
            uuid: operation.uuid.clone(),
            kind: operation.kind,
            previous,
            state: operation.state(),
            tx_hash: operation.tx_hash(),
        };
        if self.updates.send(update).is_err() {
            trace!("No subscriber for operation updates");
        }
    }

    fn invalidate(&self, operation: &Operation, config: &KindConfig) {
        self.invalidator.invalidate(InvalidationSignal {
            account: operation.account,
            kind: operation.kind,
            keys: config.invalidates.to_vec(),
        });
    }

    fn warn_on_lock_extension(&self, operation: &Operation, context: &ValidationContext) {
        if operation.kind != OperationKind::Stake {
            return;
        }
        let (Some(pool), Some(position)) = (&context.pool, &context.position) else {
            return;
        };
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        if position.is_locked(now) {
            warn!(
                uuid = %operation.uuid,
                lock_end = position.lock_end_timestamp,
                new_lock_end = pool.lock_end_after_deposit(now),
                "Deposit pushes the active lock further out"
            );
        }
    }

    fn archive(&self, report: OperationReport) {
        let mut history = self.history.lock();
        history.push_back(report);
        while history.len() > self.history_limit {
            history.pop_front();
        }
    }
}
