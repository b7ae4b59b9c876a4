use crate::validation::ValidationError;

/// Raw faults coming out of the provider, the signer or the plumbing around
/// them. These carry the original message and are classified before they
/// reach a caller.
#[derive(Debug, thiserror::Error)]
pub enum LanderError {
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Signer error: {0}")]
    SignerError(String),
    #[error("Channel closed")]
    ChannelClosed,
    #[error("{0}")]
    EyreError(#[from] eyre::Report),
}

impl LanderError {
    /// The message as the provider or signer reported it.
    pub fn raw_message(&self) -> String {
        match self {
            LanderError::ProviderError(msg) | LanderError::SignerError(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Why an operation did not succeed. This is what callers of the state
/// machine see; nothing below it is thrown across the public boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
    #[error("The request was rejected in the wallet")]
    UserRejected,
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Amount is below the pool minimum")]
    BelowMinimum,
    #[error("Amount exceeds the pool maximum")]
    ExceedsMaximum,
    #[error("Contract reverted: {0}")]
    ContractRevert(String),
    #[error("No confirmation before the deadline")]
    TimedOut,
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("An operation of this kind is already in progress for this account and target")]
    AlreadyInProgress,
    #[error("Submission failed: {0}")]
    SubmissionError(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
    /// The consumer went away before the operation finished
    #[error("Operation cancelled")]
    Cancelled,
}

impl OperationError {
    /// Short label used for metrics and structured logs
    pub fn label(&self) -> &'static str {
        match self {
            OperationError::ValidationFailed(_) => "validation_failed",
            OperationError::UserRejected => "user_rejected",
            OperationError::InsufficientBalance => "insufficient_balance",
            OperationError::BelowMinimum => "below_minimum",
            OperationError::ExceedsMaximum => "exceeds_maximum",
            OperationError::ContractRevert(_) => "contract_revert",
            OperationError::TimedOut => "timed_out",
            OperationError::NetworkUnavailable(_) => "network_unavailable",
            OperationError::AlreadyInProgress => "already_in_progress",
            OperationError::SubmissionError(_) => "submission_error",
            OperationError::Unknown(_) => "unknown",
            OperationError::Cancelled => "cancelled",
        }
    }
}
