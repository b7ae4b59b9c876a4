use tracing::debug;

use crate::OperationError;

const USER_REJECTED: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected by user",
    "action_rejected",
    "code=4001",
    "code: 4001",
    "\"code\":4001",
];
const INSUFFICIENT_BALANCE: &[&str] = &[
    "insufficient funds",
    "insufficient balance",
    "exceeds balance",
];
const BELOW_MINIMUM: &[&str] = &[
    "below minimum",
    "less than minimum",
    "min stake",
    "minimum stake",
    "amount too low",
];
const EXCEEDS_MAXIMUM: &[&str] = &[
    "exceeds maximum",
    "above maximum",
    "max stake",
    "maximum stake",
    "exceeds max",
];

/// Where a raw provider or signer message lands once classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    UserRejected,
    InsufficientBalance,
    BelowMinimum,
    ExceedsMaximum,
    ContractRevert(String),
    /// Nothing matched; the original message is kept for diagnostics
    Unknown(String),
}

impl From<ErrorClass> for OperationError {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::UserRejected => OperationError::UserRejected,
            ErrorClass::InsufficientBalance => OperationError::InsufficientBalance,
            ErrorClass::BelowMinimum => OperationError::BelowMinimum,
            ErrorClass::ExceedsMaximum => OperationError::ExceedsMaximum,
            ErrorClass::ContractRevert(reason) => OperationError::ContractRevert(reason),
            ErrorClass::Unknown(raw) => OperationError::Unknown(raw),
        }
    }
}

/// Classify a raw provider or signer message.
///
/// Matching is done on lowercase substrings of known provider wording, most
/// specific first. A message that matches nothing is never dropped: it comes
/// back as [`ErrorClass::Unknown`] carrying the original text.
pub fn classify(raw: &str) -> ErrorClass {
    let msg = raw.to_ascii_lowercase();
    let matches_any = |fragments: &[&str]| fragments.iter().any(|f| msg.contains(f));

    let class = if matches_any(USER_REJECTED) {
        ErrorClass::UserRejected
    } else if matches_any(INSUFFICIENT_BALANCE) {
        ErrorClass::InsufficientBalance
    } else if matches_any(BELOW_MINIMUM) {
        ErrorClass::BelowMinimum
    } else if matches_any(EXCEEDS_MAXIMUM) {
        ErrorClass::ExceedsMaximum
    } else if msg.contains("revert") {
        ErrorClass::ContractRevert(revert_reason(raw, &msg))
    } else {
        ErrorClass::Unknown(raw.to_owned())
    };
    debug!(raw, ?class, "Classified ledger error");
    class
}

/// Classify a message raised while handing a transaction to the signer.
///
/// Only a wallet rejection keeps its own class there. Anything else, gas
/// funding shortfalls included, is a [`OperationError::SubmissionError`]
/// carrying the raw text.
pub fn classify_submission(raw: &str) -> OperationError {
    match classify(raw) {
        ErrorClass::UserRejected => OperationError::UserRejected,
        _ => OperationError::SubmissionError(raw.to_owned()),
    }
}

// `lowercase` must be the ASCII lowercase of `raw` so byte offsets line up.
fn revert_reason(raw: &str, lowercase: &str) -> String {
    if let Some(start) = lowercase.find("reason string '") {
        let rest = &raw[start..]["reason string '".len()..];
        if let Some(end) = rest.find('\'') {
            return rest[..end].to_owned();
        }
    }
    if let Some(start) = lowercase.find("reason=\"") {
        let rest = &raw[start..]["reason=\"".len()..];
        if let Some(end) = rest.find('"') {
            return rest[..end].to_owned();
        }
    }
    if let Some(start) = lowercase.find("reverted:") {
        let reason = raw[start..]["reverted:".len()..].trim();
        if !reason.is_empty() {
            return reason.to_owned();
        }
    }
    raw.trim().to_owned()
}
