//! Drives the measurement cycle: baseline plus every thread count for every
//! workload, one configuration at a time.

use tracing::info;

use crate::aggregate::aggregate_file;
use crate::collector::{MeasurementFile, TrialRunner, collect_trials};
use crate::config::BenchConfig;
use crate::error::Result;
use crate::report::{BenchReport, WorkloadResult};
use crate::speedup::speedup_series;
use crate::worker::{Invocation, Parallelism};

pub struct Orchestrator<'a, R> {
    config: &'a BenchConfig,
    runner: R,
}

impl<'a, R: TrialRunner> Orchestrator<'a, R> {
    pub fn new(config: &'a BenchConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Every invocation a full run performs, in execution order, once per
    /// configuration (each is repeated `trials` times).
    pub fn plan(&self) -> Vec<(String, Parallelism, Invocation)> {
        let mut plan = Vec::new();
        for workload in &self.config.workloads {
            for parallelism in self.parallelisms() {
                let invocation = self.config.worker.invocation(workload, parallelism);
                plan.push((workload.clone(), parallelism, invocation));
            }
        }
        plan
    }

    pub fn run(&self) -> Result<BenchReport> {
        self.config.validate(true)?;
        let mut workloads = Vec::with_capacity(self.config.workloads.len());
        for workload in &self.config.workloads {
            workloads.push(self.run_workload(workload)?);
        }
        Ok(BenchReport::new(
            self.config.trials,
            self.config.threads.clone(),
            workloads,
        ))
    }

    pub fn run_workload(&self, workload: &str) -> Result<WorkloadResult> {
        let baseline = self.measure(workload, Parallelism::Baseline)?;
        let mut measurements = Vec::with_capacity(self.config.threads.len());
        for &threads in &self.config.threads {
            let parallel = self.measure(workload, Parallelism::Threads(threads))?;
            measurements.push((threads, parallel));
        }
        let points = speedup_series(baseline, &measurements);
        Ok(WorkloadResult {
            label: workload.to_string(),
            baseline,
            points,
        })
    }

    /// Collects and averages `trials` runs for one configuration.
    pub fn measure(&self, workload: &str, parallelism: Parallelism) -> Result<f64> {
        let invocation = self.config.worker.invocation(workload, parallelism);
        let file = MeasurementFile::create(&self.config.work_dir, workload, parallelism)?;
        collect_trials(&self.runner, &invocation, self.config.trials, &file)?;
        let mean = aggregate_file(file.path(), self.config.trials)?;
        info!(workload, %parallelism, mean, trials = self.config.trials, "measured");
        Ok(mean)
    }

    fn parallelisms(&self) -> impl Iterator<Item = Parallelism> + '_ {
        std::iter::once(Parallelism::Baseline).chain(self.config.threads.iter().map(|&t| Parallelism::Threads(t)))
    }
}
