#![deny(clippy::unwrap_used, clippy::panic)]
#![deny(clippy::arithmetic_side_effects)]

pub use cache::{BroadcastInvalidator, CacheInvalidator, CacheKey, InvalidationSignal};
pub use calls::{build_call, CallData, LiquidityAmounts, OperationParams, OperationTarget};
pub use classifier::{classify, classify_submission, ErrorClass};
pub use error::{LanderError, OperationError};
pub use kinds::{KindConfig, KindTable};
pub use machine::{OperationRequest, OperationStateMachine};
pub use metrics::DispatcherMetrics;
pub use operation::{Operation, OperationReport, OperationState, OperationUpdate};
pub use poller::{PollOutcome, ReceiptPoller};
pub use provider::{
    connect_http, EthersLedger, HttpLedger, LedgerProvider, LedgerSigner, ReceiptStatus,
};
pub use settings::{DispatcherSettings, KindOverride};
pub use trace::{Level, Style, TracingConfig};
pub use validation::{ValidationContext, ValidationError};

pub mod gas_price;
pub mod nonce;
pub mod submitter;

mod cache;
mod calls;
mod classifier;
mod error;
mod kinds;
mod machine;
mod metrics;
mod operation;
mod poller;
mod provider;
mod settings;
mod trace;
mod validation;
