use chrono::{DateTime, Utc};
use strum::Display;
use tracing::{info, warn};

use stakeflow_core::{Address, OperationKind, OperationUuid, H256, U256};

use crate::calls::OperationTarget;
use crate::OperationError;

/// Lifecycle of one operation. Moves forward only; the last three states are
/// terminal and sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationState {
    Idle,
    /// validating inputs, nothing sent yet
    Preparing,
    /// gas price and nonce resolved, waiting on the wallet
    AwaitingSignature,
    /// the wallet returned a transaction hash
    Submitted,
    /// polling for a receipt
    Confirming,
    Succeeded,
    Failed,
    /// no receipt before the deadline; the transaction may still land
    TimedOut,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::Failed | OperationState::TimedOut
        )
    }

    fn rank(&self) -> u8 {
        match self {
            OperationState::Idle => 0,
            OperationState::Preparing => 1,
            OperationState::AwaitingSignature => 2,
            OperationState::Submitted => 3,
            OperationState::Confirming => 4,
            OperationState::Succeeded | OperationState::Failed | OperationState::TimedOut => 5,
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic
    pub fn can_transition_to(&self, next: OperationState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// One mutating action, owned by the state machine for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Operation {
    pub uuid: OperationUuid,
    pub kind: OperationKind,
    pub account: Address,
    /// base units; `None` for kinds that carry no amount
    pub amount: Option<U256>,
    pub target: OperationTarget,
    pub started_at: DateTime<Utc>,
    /// end of the polling window, known once the operation is confirming
    pub deadline: Option<DateTime<Utc>>,
    state: OperationState,
    tx_hash: Option<H256>,
    error: Option<OperationError>,
}

impl Operation {
    pub fn new(
        kind: OperationKind,
        account: Address,
        amount: Option<U256>,
        target: OperationTarget,
    ) -> Self {
        Self {
            uuid: OperationUuid::random(),
            kind,
            account,
            amount,
            target,
            started_at: Utc::now(),
            deadline: None,
            state: OperationState::Idle,
            tx_hash: None,
            error: None,
        }
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn tx_hash(&self) -> Option<H256> {
        self.tx_hash
    }

    /// Only ever set on a failed operation
    pub fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    /// Move to `next`, returning the previous state. Regressions and moves
    /// out of a terminal state are refused and leave the operation untouched.
    pub(crate) fn transition(&mut self, next: OperationState) -> Option<OperationState> {
        let previous = self.state;
        if !previous.can_transition_to(next) {
            warn!(
                uuid = %self.uuid,
                kind = %self.kind,
                from = %previous,
                to = %next,
                "Refusing operation state regression"
            );
            return None;
        }
        self.state = next;
        info!(
            uuid = %self.uuid,
            kind = %self.kind,
            from = %previous,
            to = %next,
            tx_hash = ?self.tx_hash,
            "Operation state transition"
        );
        Some(previous)
    }

    /// Record the transaction hash. A hash is recorded at most once.
    pub(crate) fn record_tx_hash(&mut self, tx_hash: H256) -> bool {
        if let Some(existing) = self.tx_hash {
            warn!(uuid = %self.uuid, ?existing, ?tx_hash, "Transaction hash already recorded");
            return false;
        }
        self.tx_hash = Some(tx_hash);
        true
    }

    /// Move to `Failed` carrying `error`.
    pub(crate) fn fail(&mut self, error: OperationError) -> Option<OperationState> {
        let previous = self.transition(OperationState::Failed)?;
        self.error = Some(error);
        Some(previous)
    }

    pub fn report(&self) -> OperationReport {
        OperationReport {
            uuid: self.uuid.clone(),
            kind: self.kind,
            account: self.account,
            state: self.state,
            tx_hash: self.tx_hash,
            error: self.error.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// What a caller gets back once an operation reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub uuid: OperationUuid,
    pub kind: OperationKind,
    pub account: Address,
    pub state: OperationState,
    pub tx_hash: Option<H256>,
    pub error: Option<OperationError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OperationReport {
    pub fn is_success(&self) -> bool {
        self.state == OperationState::Succeeded
    }

    /// Human readable summary of the outcome.
    pub fn message(&self) -> String {
        let kind = self.kind;
        match (self.state, self.tx_hash) {
            (OperationState::Succeeded, Some(hash)) => {
                format!("{kind} confirmed in transaction {hash:?}")
            }
            (OperationState::Succeeded, None) => format!("{kind} confirmed"),
            (OperationState::TimedOut, Some(hash)) => format!(
                "{kind} was submitted in transaction {hash:?} but no confirmation arrived in time. \
                 It may still confirm; check the transaction before trying again"
            ),
            (OperationState::TimedOut, None) => {
                format!("{kind} was not confirmed in time and may still confirm")
            }
            (OperationState::Failed, hash) => {
                let reason = self
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown error".to_owned());
                match hash {
                    Some(hash) => format!("{kind} failed: {reason} (transaction {hash:?})"),
                    None => format!("{kind} failed: {reason}"),
                }
            }
            (state, _) => format!("{kind} is {state}"),
        }
    }
}

/// Published on every state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationUpdate {
    pub uuid: OperationUuid,
    pub kind: OperationKind,
    pub previous: OperationState,
    pub state: OperationState,
    pub tx_hash: Option<H256>,
}
