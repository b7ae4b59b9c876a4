use prometheus::{
    opts, register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_vec_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntCounterVec, IntGauge, IntGaugeVec, Registry,
};

use stakeflow_core::{OperationKind, U256};

use crate::operation::OperationState;

const METRICS_NAMESPACE: &str = "stakeflow_lander";

/// Prefix a metric name with the namespace.
fn namespaced(name: &str) -> String {
    format!("{}_{}", METRICS_NAMESPACE, name)
}

/// Metrics for the operation dispatcher
#[derive(Clone)]
pub struct DispatcherMetrics {
    /// Metrics registry for adding new metrics and gathering reports
    registry: Registry,

    pub operations_started: IntCounterVec,
    // labelled with the terminal state
    pub operations_finished: IntCounterVec,
    pub operations_in_flight: IntGaugeVec,
    // includes a label for the error, only for failed operations
    pub operation_errors: IntCounterVec,

    // last gas price handed to the signer, premium included
    pub gas_price: IntGauge,
    pub receipt_polls: IntCounter,
    pub transient_poll_errors: IntCounter,
}

impl DispatcherMetrics {
    pub fn new(registry: Registry) -> eyre::Result<Self> {
        let operations_started = register_int_counter_vec_with_registry!(
            opts!(
                namespaced("operations_started"),
                "The number of operations started",
            ),
            &["kind",],
            registry.clone()
        )?;
        let operations_finished = register_int_counter_vec_with_registry!(
            opts!(
                namespaced("operations_finished"),
                "The number of operations that reached a terminal state",
            ),
            &["kind", "state",],
            registry.clone()
        )?;
        let operations_in_flight = register_int_gauge_vec_with_registry!(
            opts!(
                namespaced("operations_in_flight"),
                "The number of operations not yet in a terminal state",
            ),
            &["kind",],
            registry.clone()
        )?;
        let operation_errors = register_int_counter_vec_with_registry!(
            opts!(
                namespaced("operation_errors"),
                "The number of failed operations, by error",
            ),
            &["kind", "error",],
            registry.clone()
        )?;
        let gas_price = register_int_gauge_with_registry!(
            opts!(
                namespaced("gas_price"),
                "The last premium gas price used for a submission",
            ),
            registry.clone()
        )?;
        let receipt_polls = register_int_counter_with_registry!(
            opts!(
                namespaced("receipt_polls"),
                "The number of receipt queries made while confirming",
            ),
            registry.clone()
        )?;
        let transient_poll_errors = register_int_counter_with_registry!(
            opts!(
                namespaced("transient_poll_errors"),
                "The number of receipt queries that failed and were retried",
            ),
            registry.clone()
        )?;

        Ok(Self {
            registry,
            operations_started,
            operations_finished,
            operations_in_flight,
            operation_errors,
            gas_price,
            receipt_polls,
            transient_poll_errors,
        })
    }

    pub fn update_started_metric(&self, kind: OperationKind) {
        let kind = kind.to_string();
        self.operations_started.with_label_values(&[&kind]).inc();
        self.operations_in_flight.with_label_values(&[&kind]).inc();
    }

    pub fn update_finished_metric(&self, kind: OperationKind, state: OperationState) {
        let kind = kind.to_string();
        self.operations_in_flight.with_label_values(&[&kind]).dec();
        self.operations_finished
            .with_label_values(&[&kind, &state.to_string()])
            .inc();
    }

    /// An operation abandoned by its consumer leaves the in-flight gauge
    /// without being counted as finished.
    pub fn update_abandoned_metric(&self, kind: OperationKind) {
        self.operations_in_flight
            .with_label_values(&[&kind.to_string()])
            .dec();
    }

    pub fn update_error_metric(&self, kind: OperationKind, error: &str) {
        self.operation_errors
            .with_label_values(&[&kind.to_string(), error])
            .inc();
    }

    pub fn update_gas_price_metric(&self, gas_price: U256) {
        let clamped = gas_price.min(U256::from(i64::MAX as u64));
        self.gas_price.set(clamped.as_u64() as i64);
    }

    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 64);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used)]
    pub fn dummy_instance() -> Self {
        let registry = Registry::new();
        let instance = Self::new(registry.clone());
        instance.unwrap()
    }
}
