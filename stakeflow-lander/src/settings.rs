//! Load dispatcher settings from an optional JSON file plus `STAKEFLOW__`
//! environment variables. The prefix and nested keys are both separated by
//! `__`, e.g. `STAKEFLOW__KINDS__ADD_LIQUIDITY__TIMEOUT_SECS=240`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use eyre::{eyre, Context, Result};

use stakeflow_core::OperationKind;

use crate::provider::{connect_http, HttpLedger};
use crate::trace::TracingConfig;

const ENV_PREFIX: &str = "STAKEFLOW";
const ENV_SEPARATOR: &str = "__";

/// Optional per-kind replacements for the built-in defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct KindOverride {
    pub timeout_secs: Option<u64>,
    pub gas_limit: Option<u64>,
}

/// Everything the operation dispatcher reads at startup
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DispatcherSettings {
    /// JSON-RPC endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// number of finished operations kept for `history()`
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_update_capacity")]
    pub update_capacity: usize,
    #[serde(default)]
    pub kinds: HashMap<OperationKind, KindOverride>,
    #[serde(default)]
    pub tracing: TracingConfig,
}

fn default_poll_interval_ms() -> u64 {
    2_500
}

fn default_history_limit() -> usize {
    32
}

fn default_update_capacity() -> usize {
    64
}

impl DispatcherSettings {
    /// Settings from `path` (when given), overridden by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );
        Self::build(builder)
    }

    /// Settings from a JSON document alone, ignoring the environment.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(json, FileFormat::Json)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Self = builder
            .build()
            .context("Failed to load config sources")?
            .try_deserialize()
            .context("Failed to deserialize dispatcher settings")?;
        if settings.poll_interval_ms == 0 {
            eyre::bail!("poll_interval_ms must be greater than zero");
        }
        Ok(settings)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Ledger over `rpc_url`, signing with `private_key` for `chain_id`.
    pub fn connect(&self, private_key: &str) -> Result<HttpLedger> {
        let rpc_url = self
            .rpc_url
            .as_deref()
            .ok_or_else(|| eyre!("rpc_url is not configured"))?;
        connect_http(rpc_url, private_key, self.chain_id)
    }
}
