//! # Escrow Telemetry
//!
//! Observability for the escrow platform.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter, plain or JSON output
//! - **Metrics**: Prometheus counters incremented by the subsystem crates
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ev_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("logging already installed");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EV_LOG_LEVEL` | `RUST_LOG`, then `info` | Log level filter |
//! | `EV_JSON_LOGS` | `false` | Emit JSON lines instead of text |
//! | `EV_SERVICE_NAME` | `escrow-vault` | Service name attached to logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, register_metrics, BOT_EXECUTIONS, EMERGENCY_PAUSES, ESCROWS_CREATED,
    EXECUTIONS, SIGNATURE_REJECTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
