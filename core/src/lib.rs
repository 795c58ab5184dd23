//! Speedup benchmarking for external parallel programs.
//!
//! A worker program is run at a baseline and at several thread counts, each
//! configuration averaged over a fixed number of trials, and the resulting
//! speedups are reported as tables, JSON/CSV and a line chart.

pub mod aggregate;
pub mod chart;
pub mod collector;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod speedup;
pub mod worker;

#[cfg(test)]
mod aggregate_test;
#[cfg(test)]
mod orchestrator_test;

pub use chart::{Chart, LabeledSeries, render_chart};
pub use collector::{CommandRunner, TrialRunner};
pub use config::{BenchConfig, ChartConfig, Preset, WorkerConfig};
pub use error::BenchError;
pub use orchestrator::Orchestrator;
pub use report::{BenchReport, WorkloadResult};
pub use speedup::{Speedup, SpeedupPoint};
pub use worker::{Invocation, Parallelism};
