//! Run results and their on-disk forms (JSON, CSV, a plain-text table).

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::aggregate_file;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::speedup::{SpeedupPoint, speedup_series};
use crate::worker::{Parallelism, expand};

pub const DEFAULT_RECORDED_PATTERN: &str = "{workload}_parfiles_{threads}.txt";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchReport {
    pub generated_at: String,
    pub trials: usize,
    pub threads: Vec<u32>,
    pub workloads: Vec<WorkloadResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadResult {
    pub label: String,
    /// Aggregate elapsed time of the single-threaded run.
    pub baseline: f64,
    pub points: Vec<SpeedupPoint>,
}

impl BenchReport {
    pub fn new(trials: usize, threads: Vec<u32>, workloads: Vec<WorkloadResult>) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            trials,
            threads,
            workloads,
        }
    }

    pub fn undefined_points(&self) -> usize {
        self.workloads
            .iter()
            .flat_map(|w| w.points.iter())
            .filter(|p| !p.speedup.is_defined())
            .count()
    }

    pub fn to_table(&self) -> String {
        let width = self
            .workloads
            .iter()
            .map(|w| w.label.len())
            .max()
            .unwrap_or(0)
            .max("workload".len());
        let mut out = String::new();
        let _ = writeln!(out, "{:<width$}  {:>7}  {:>12}  {:>9}", "workload", "threads", "time", "speedup");
        for workload in &self.workloads {
            let _ = writeln!(
                out,
                "{:<width$}  {:>7}  {:>12.4}  {:>9}",
                workload.label, 1, workload.baseline, "baseline"
            );
            for point in &workload.points {
                let _ = writeln!(
                    out,
                    "{:<width$}  {:>7}  {:>12.4}  {:>9}",
                    workload.label,
                    point.threads,
                    point.parallel,
                    point.speedup.to_string()
                );
            }
        }
        out
    }
}

pub fn write_json(path: &Path, report: &BenchReport) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|e| BenchError::Serialize(e.to_string()))?;
    writer.flush().map_err(|e| BenchError::io(path, e))
}

pub fn write_csv(path: &Path, report: &BenchReport) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_csv_rows(&mut writer, report).map_err(|e| BenchError::io(path, e))
}

fn write_csv_rows<W: Write>(writer: &mut W, report: &BenchReport) -> std::io::Result<()> {
    writeln!(writer, "workload,threads,baseline,parallel,speedup")?;
    for workload in &report.workloads {
        for point in &workload.points {
            let speedup = match point.speedup.ratio() {
                Some(ratio) => format!("{:.6}", ratio),
                None => "undefined".to_string(),
            };
            writeln!(
                writer,
                "{},{},{:.6},{:.6},{}",
                csv_field(&workload.label),
                point.threads,
                workload.baseline,
                point.parallel,
                speedup
            )?;
        }
    }
    writer.flush()
}

/// Quotes a field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Builds a report from measurement files recorded by an earlier run.
///
/// `pattern` names one file per (workload, threads) pair; the baseline file
/// uses thread count `1`. Each file contributes the mean of its first
/// `config.trials` lines and is left in place.
///
/// A thread count of `1` in `config.threads` therefore names the baseline file
/// again and always yields a speedup of exactly 1. A live run measures that
/// point separately through the parallel worker arguments.
pub fn load_recorded(config: &BenchConfig, dir: &Path, pattern: &str) -> Result<BenchReport> {
    if config.threads.contains(&1) {
        warn!(pattern, "thread count 1 reuses the baseline file; its speedup is 1 by construction");
    }
    let mut workloads = Vec::with_capacity(config.workloads.len());
    for workload in &config.workloads {
        let read = |parallelism: Parallelism| {
            let name = expand(pattern, workload, &parallelism.thread_count().to_string());
            aggregate_file(&dir.join(name), config.trials)
        };
        let baseline = read(Parallelism::Baseline)?;
        let mut measurements = Vec::with_capacity(config.threads.len());
        for &threads in &config.threads {
            measurements.push((threads, read(Parallelism::Threads(threads))?));
        }
        info!(workload = %workload, baseline, "loaded recorded measurements");
        workloads.push(WorkloadResult {
            label: workload.clone(),
            baseline,
            points: speedup_series(baseline, &measurements),
        });
    }
    Ok(BenchReport::new(config.trials, config.threads.clone(), workloads))
}
