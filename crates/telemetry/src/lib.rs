//! Telemetry for the landing engine.
//!
//! Structured logging setup, in-process metrics and a component health
//! registry. Metrics are periodically written to the log by the worker
//! scheduler rather than exported to an external system.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
