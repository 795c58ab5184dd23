//! Run configuration: which worker to launch, which workloads and thread
//! counts to measure, how many trials to average and where the chart goes.
//!
//! Configurations are plain TOML. The three benchmark layouts this tool grew
//! out of ship as [`Preset`]s so they can be run (or printed and edited)
//! without writing a file first.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

pub const DEFAULT_THREADS: [u32; 5] = [2, 4, 6, 8, 12];
pub const DEFAULT_CHART_PATH: &str = "speedup-image.svg";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Trials averaged into every aggregate measurement.
    pub trials: usize,
    /// Thread counts measured after the baseline, in plotting order.
    pub threads: Vec<u32>,
    pub workloads: Vec<String>,
    /// Directory holding intermediate measurement files.
    pub work_dir: PathBuf,
    pub worker: WorkerConfig,
    pub chart: ChartConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials: 5,
            threads: DEFAULT_THREADS.to_vec(),
            workloads: Vec::new(),
            work_dir: PathBuf::from("."),
            worker: WorkerConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

/// How the external worker is launched.
///
/// The final argument list is `args` followed by either `baseline_args` or
/// `parallel_args`, with `{workload}` and `{threads}` substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub baseline_args: Vec<String>,
    pub parallel_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            baseline_args: vec!["s".to_string(), "{workload}".to_string()],
            parallel_args: vec!["p".to_string(), "{workload}".to_string(), "{threads}".to_string()],
            cwd: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    /// Command turning the SVG chart into another format, with `{input}` and
    /// `{output}` placeholders. Only used for non-SVG output paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rasterizer: Option<Vec<String>>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_CHART_PATH),
            title: None,
            x_label: "Number of Threads".to_string(),
            y_label: "Speedup".to_string(),
            width: 800,
            height: 600,
            rasterizer: None,
        }
    }
}

impl ChartConfig {
    /// True when `output` has an `.svg` extension (any case).
    pub fn is_svg(&self) -> bool {
        self.output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
    }

    /// Checks that `output` can be produced at all: SVG is written directly,
    /// anything else needs a non-empty rasterizer command.
    pub fn check_output(&self) -> Result<()> {
        if self.is_svg() {
            return Ok(());
        }
        match self.rasterizer.as_deref() {
            Some([]) => Err(BenchError::config("chart.rasterizer is empty")),
            Some(_) => Ok(()),
            None => Err(BenchError::UnsupportedChartFormat(self.output.clone())),
        }
    }
}

impl BenchConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| BenchError::config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        toml::from_str(&source).map_err(|e| BenchError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BenchError::Serialize(e.to_string()))
    }

    /// Checks the invariants the orchestrator relies on. `needs_worker` is
    /// false for offline reports, which never launch anything.
    pub fn validate(&self, needs_worker: bool) -> Result<()> {
        if self.trials == 0 {
            return Err(BenchError::config("trials must be at least 1"));
        }
        if self.threads.is_empty() {
            return Err(BenchError::config("at least one thread count is required"));
        }
        if let Some(zero) = self.threads.iter().position(|t| *t == 0) {
            return Err(BenchError::config(format!("threads[{}] must be at least 1", zero)));
        }
        if let Some(i) = self.threads.windows(2).position(|w| w[0] >= w[1]) {
            return Err(BenchError::config(format!(
                "threads must be strictly ascending (threads[{}] = {} follows {})",
                i + 1,
                self.threads[i + 1],
                self.threads[i]
            )));
        }
        if self.workloads.is_empty() {
            return Err(BenchError::config("at least one workload is required"));
        }
        for name in &self.workloads {
            validate_workload_name(name)?;
        }
        if needs_worker && self.worker.program.trim().is_empty() {
            return Err(BenchError::config("worker.program is empty"));
        }
        if self.chart.width < 300 || self.chart.height < 200 {
            return Err(BenchError::config(format!(
                "chart size {}x{} is too small (minimum 300x200)",
                self.chart.width, self.chart.height
            )));
        }
        Ok(())
    }
}

/// Workload names end up inside intermediate file names, so they must stay a
/// single path component.
pub fn validate_workload_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BenchError::config("workload names must not be empty"));
    }
    let mut components = Path::new(name).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
    if !single_normal || name.contains(['/', '\\']) {
        return Err(BenchError::config(format!(
            "workload '{}' must not contain path separators or '..'",
            name
        )));
    }
    Ok(())
}

/// Built-in configurations matching the benchmark layouts the tool replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Feed server benchmark: five trials, `s`/`p` mode flags.
    Twitter,
    /// Image editor benchmark: one trial, thread count `1` as the baseline.
    Editor,
    /// Pre-recorded `*_parfiles_*.txt` results, used with offline reports.
    Parfiles,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Twitter, Preset::Editor, Preset::Parfiles];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Twitter => "twitter",
            Preset::Editor => "editor",
            Preset::Parfiles => "parfiles",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Twitter => "feed benchmark, 5 trials, xsmall..xlarge",
            Preset::Editor => "image editor, 1 trial, parfiles/parslices schedulers",
            Preset::Parfiles => "offline report over <workload>_parfiles_<threads>.txt files",
        }
    }

    pub fn config(self) -> BenchConfig {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match self {
            Preset::Twitter => BenchConfig {
                trials: 5,
                workloads: strings(&["xsmall", "small", "medium", "large", "xlarge"]),
                worker: WorkerConfig {
                    program: "go".to_string(),
                    args: strings(&["run", "benchmark.go"]),
                    baseline_args: strings(&["s", "{workload}"]),
                    parallel_args: strings(&["p", "{workload}", "{threads}"]),
                    cwd: None,
                },
                ..BenchConfig::default()
            },
            Preset::Editor => BenchConfig {
                trials: 1,
                workloads: strings(&["parfiles", "parslices"]),
                worker: WorkerConfig {
                    program: "go".to_string(),
                    args: strings(&["run", "../editor/editor.go"]),
                    baseline_args: strings(&["test", "{workload}", "{threads}"]),
                    parallel_args: strings(&["test", "{workload}", "{threads}"]),
                    cwd: None,
                },
                ..BenchConfig::default()
            },
            Preset::Parfiles => BenchConfig {
                trials: 1,
                workloads: strings(&["small", "mixture", "big"]),
                chart: ChartConfig {
                    output: PathBuf::from("speedup-images.svg"),
                    ..ChartConfig::default()
                },
                ..BenchConfig::default()
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = BenchError;

    fn from_str(raw: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| {
                let known: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                BenchError::config(format!("unknown preset '{}' (known: {})", raw, known.join(", ")))
            })
    }
}
