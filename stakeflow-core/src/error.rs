/// Result alias for core helpers.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by pure helpers in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The decimal string could not be turned into base units
    #[error("Invalid token amount `{input}`: {reason}")]
    InvalidAmount {
        /// the offending user input
        input: String,
        /// why it was refused
        reason: String,
    },
    /// Token decimals outside of what the ledger supports
    #[error("Unsupported token decimals {0}, expected at most 77")]
    UnsupportedDecimals(u8),
}

impl CoreError {
    pub(crate) fn invalid_amount(input: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}
