use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

use crate::utils::CircuitState;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Tracks:
// - Order outcomes (placed, rejected for stock, fallback responses)
// - Inventory call latency
// - Circuit breaker state and transitions
//
// Scraped via GET /metrics on the main HTTP server.
// ============================================================================

/// Central metrics registry for the service.
pub struct Metrics {
    registry: Registry,

    pub orders_placed: IntCounter,
    pub orders_rejected_out_of_stock: IntCounter,
    pub orders_fallback: IntCounter,

    pub inventory_call_duration: HistogramVec,

    pub circuit_breaker_state: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_placed = IntCounter::new(
            "orders_placed_total",
            "Orders persisted and confirmed",
        )?;
        registry.register(Box::new(orders_placed.clone()))?;

        let orders_rejected_out_of_stock = IntCounter::new(
            "orders_rejected_out_of_stock_total",
            "Orders rejected because a SKU was out of stock",
        )?;
        registry.register(Box::new(orders_rejected_out_of_stock.clone()))?;

        let orders_fallback = IntCounter::new(
            "orders_fallback_total",
            "Requests answered with the fallback message",
        )?;
        registry.register(Box::new(orders_fallback.clone()))?;

        let inventory_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "inventory_call_duration_seconds",
                "Inventory stock-check call duration",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(inventory_call_duration.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "inventory_circuit_breaker_state",
            "Inventory circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new(
                "inventory_circuit_breaker_transitions_total",
                "Inventory circuit breaker state transitions",
            ),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            orders_rejected_out_of_stock,
            orders_fallback,
            inventory_call_duration,
            circuit_breaker_state,
            circuit_breaker_transitions,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_inventory_call(&self, outcome: &str, duration_secs: f64) {
        self.inventory_call_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    pub fn update_circuit_breaker_state(&self, state: CircuitState) {
        let value = match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        };
        self.circuit_breaker_state.set(value);
    }

    pub fn record_circuit_breaker_transition(&self, from: CircuitState, to: CircuitState) {
        self.circuit_breaker_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_order_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_placed.inc();
        metrics.orders_fallback.inc();
        metrics.orders_fallback.inc();

        let gathered = metrics.registry.gather();
        let placed = gathered
            .iter()
            .find(|m| m.name() == "orders_placed_total")
            .unwrap();
        assert_eq!(placed.metric[0].counter.value, Some(1.0));

        let fallback = gathered
            .iter()
            .find(|m| m.name() == "orders_fallback_total")
            .unwrap();
        assert_eq!(fallback.metric[0].counter.value, Some(2.0));
    }

    #[test]
    fn test_circuit_breaker_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.update_circuit_breaker_state(CircuitState::Closed);
        metrics.record_circuit_breaker_transition(CircuitState::Closed, CircuitState::Open);
        metrics.update_circuit_breaker_state(CircuitState::Open);

        let gathered = metrics.registry.gather();
        let state = gathered
            .iter()
            .find(|m| m.name() == "inventory_circuit_breaker_state")
            .unwrap();
        assert_eq!(state.metric[0].gauge.value, Some(1.0));
    }

    #[test]
    fn test_inventory_call_histogram() {
        let metrics = Metrics::new().unwrap();
        metrics.record_inventory_call("success", 0.02);
        metrics.record_inventory_call("failure", 1.2);

        let gathered = metrics.registry.gather();
        let duration = gathered
            .iter()
            .find(|m| m.name() == "inventory_call_duration_seconds")
            .unwrap();
        assert_eq!(duration.metric.len(), 2);
    }
}
