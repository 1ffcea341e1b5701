//! Benchmark harness for an external single-net buffer-insertion tool.
//!
//! A sweep generates one synthetic net per wire length, runs the tool a fixed
//! number of times per length, averages its self-reported runtime and keeps the
//! reported RAT. The aggregated curve is persisted as a flat text table and
//! rendered as two line charts.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod invoke;
pub mod output;
pub mod plot;
pub mod signal;
pub mod store;
pub mod sweep;
pub mod testcase;

pub use aggregate::{AggregatedResult, MeasurementSample, TrialRunner, aggregate};
pub use config::{HarnessConfig, SweepRange};
pub use error::{BenchError, Result};
pub use invoke::ExternalTool;
pub use signal::cancel_on_signals;
pub use sweep::{CancelToken, SweepReport, TaskFailure, run_sweep};
