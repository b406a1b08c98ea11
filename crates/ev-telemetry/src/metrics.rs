//! Prometheus metrics for the escrow subsystems.
//!
//! All metrics follow the naming convention: `ev_<metric>_total`. Every
//! metric here is a counter; label values are short static strings so
//! cardinality stays bounded.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // FACTORY (EV-04)
    // =========================================================================

    /// Escrows deployed by any factory
    pub static ref ESCROWS_CREATED: IntCounter = IntCounter::new(
        "ev_escrows_created_total",
        "Total number of escrows created"
    ).expect("metric creation failed");

    // =========================================================================
    // ESCROW (EV-03)
    // =========================================================================

    /// Successful outbound executions by path
    pub static ref EXECUTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("ev_executions_total", "Successful escrow executions"),
        &["path"]  // direct, multicall, signatures
    ).expect("metric creation failed");

    /// Signatures dropped or refused during signature-gated execution
    pub static ref SIGNATURE_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("ev_signature_rejections_total", "Rejected approver signatures"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // CIRCUIT BREAKER (EV-02)
    // =========================================================================

    /// Pause activations by scope
    pub static ref EMERGENCY_PAUSES: IntCounterVec = IntCounterVec::new(
        Opts::new("ev_emergency_pauses_total", "Emergency pause activations"),
        &["scope"]  // global, function, escrow
    ).expect("metric creation failed");

    // =========================================================================
    // MANAGER (EV-05)
    // =========================================================================

    /// Bot-submitted executions by outcome
    pub static ref BOT_EXECUTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("ev_bot_executions_total", "Bot executions through the manager"),
        &["outcome"]  // success, failure
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), TelemetryError>> = OnceLock::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() -> Result<(), TelemetryError> {
    REGISTERED
        .get_or_init(|| {
            let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
                Box::new(ESCROWS_CREATED.clone()),
                Box::new(EXECUTIONS.clone()),
                Box::new(SIGNATURE_REJECTIONS.clone()),
                Box::new(EMERGENCY_PAUSES.clone()),
                Box::new(BOT_EXECUTIONS.clone()),
            ];

            for metric in metrics {
                REGISTRY
                    .register(metric)
                    .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            }
            Ok(())
        })
        .clone()
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    register_metrics()?;

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
