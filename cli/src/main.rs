use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use parspeed_core::{
    BenchConfig, BenchError, BenchReport, Chart, CommandRunner, Orchestrator, Preset, render_chart,
    report::{DEFAULT_RECORDED_PATTERN, load_recorded, write_csv, write_json},
};


static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "parspeed_core=info,parspeed=info";
const DEFAULT_CONFIG_FILE: &str = "parspeed.toml";

#[derive(Debug, Parser)]
#[command(
    name = "parspeed",
    author,
    version,
    about = "Measure and chart the speedup of a parallel program",
    long_about = None
)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the worker for every workload and thread count, then chart the speedups.
    Run {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        outputs: Outputs,
    },
    /// Print the worker invocations a run would perform, without running them.
    Plan {
        #[command(flatten)]
        selection: Selection,
    },
    /// Compute speedups from previously recorded measurement files.
    Report {
        /// Directory containing the recorded files
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,
        /// File name template; `{threads}` is 1 for the baseline
        #[arg(long, default_value = DEFAULT_RECORDED_PATTERN)]
        pattern: String,
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        outputs: Outputs,
    },
    /// List the built-in presets, or print one as TOML.
    Presets {
        #[arg(value_name = "NAME", value_parser = parse_preset)]
        name: Option<Preset>,
    },
}

/// Where the configuration comes from, plus per-run overrides.
#[derive(Debug, Args)]
struct Selection {
    /// TOML configuration file (defaults to ./parspeed.toml, then the twitter preset)
    #[arg(long, short, value_name = "FILE", conflicts_with = "preset")]
    config: Option<PathBuf>,
    /// Built-in configuration to start from
    #[arg(long, short, value_parser = parse_preset)]
    preset: Option<Preset>,
    /// Trials averaged per configuration
    #[arg(long)]
    trials: Option<usize>,
    /// Comma-separated thread counts, e.g. 2,4,8
    #[arg(long, value_delimiter = ',')]
    threads: Option<Vec<u32>>,
    /// Comma-separated workload names
    #[arg(long, value_delimiter = ',')]
    workloads: Option<Vec<String>>,
    /// Directory for intermediate measurement files
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct Outputs {
    /// Chart path: .svg, or any format produced by chart.rasterizer
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Also write the report as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
    /// Also write the report as CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
    /// Skip rendering the chart
    #[arg(long)]
    no_chart: bool,
}

fn parse_preset(raw: &str) -> Result<Preset, String> {
    raw.parse().map_err(|e: BenchError| e.to_string())
}

impl Selection {
    fn resolve(&self) -> anyhow::Result<BenchConfig> {
        self.resolve_in(Path::new("."))
    }

    fn resolve_in(&self, cwd: &Path) -> anyhow::Result<BenchConfig> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => {
                BenchConfig::load(path).with_context(|| format!("Failed to load config '{}'", path.display()))?
            }
            (None, Some(preset)) => preset.config(),
            (None, None) => {
                let implicit = cwd.join(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    tracing::info!(path = %implicit.display(), "using configuration file");
                    BenchConfig::load(&implicit)
                        .with_context(|| format!("Failed to load config '{}'", implicit.display()))?
                } else {
                    Preset::Twitter.config()
                }
            }
        };

        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(threads) = &self.threads {
            config.threads = threads.clone();
        }
        if let Some(workloads) = &self.workloads {
            config.workloads = workloads.iter().map(|w| w.trim().to_string()).collect();
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        Ok(config)
    }
}

impl Outputs {
    fn apply(&self, config: &mut BenchConfig) {
        if let Some(path) = &self.output {
            config.chart.output = path.clone();
        }
    }

    /// Rejects a chart path that could never be written, before any work is done.
    fn check(&self, config: &BenchConfig) -> anyhow::Result<()> {
        if !self.no_chart {
            config.chart.check_output().context("Invalid chart output")?;
        }
        Ok(())
    }
}

fn init_tracing() {
    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = std::env::var("PARSPEED_LOG")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|expr| !expr.trim().is_empty());

        let builder = fmt().with_writer(std::io::stderr);
        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn run_benchmark(selection: &Selection, outputs: &Outputs) -> anyhow::Result<()> {
    let mut config = selection.resolve()?;
    outputs.apply(&mut config);
    config.validate(true).context("Invalid configuration")?;
    outputs.check(&config)?;

    let report = Orchestrator::new(&config, CommandRunner)
        .run()
        .context("Benchmark run failed")?;
    publish(&config, &report, outputs)
}

fn print_plan(selection: &Selection) -> anyhow::Result<()> {
    let config = selection.resolve()?;
    config.validate(true).context("Invalid configuration")?;

    let orchestrator = Orchestrator::new(&config, CommandRunner);
    for (_, _, invocation) in orchestrator.plan() {
        println!("{}x {}", config.trials, invocation);
    }
    Ok(())
}

fn report_recorded(dir: &Path, pattern: &str, selection: &Selection, outputs: &Outputs) -> anyhow::Result<()> {
    let mut config = selection.resolve()?;
    outputs.apply(&mut config);
    config.validate(false).context("Invalid configuration")?;
    outputs.check(&config)?;

    let report = load_recorded(&config, dir, pattern)
        .with_context(|| format!("Failed to read recorded measurements in '{}'", dir.display()))?;
    publish(&config, &report, outputs)
}

/// Prints the table and writes every requested artifact.
fn publish(config: &BenchConfig, report: &BenchReport, outputs: &Outputs) -> anyhow::Result<()> {
    print!("{}", report.to_table());

    let undefined = report.undefined_points();
    if undefined > 0 {
        tracing::warn!(undefined, "some speedups are undefined (zero or non-finite measurements)");
    }

    // JSON and CSV go out before the chart.
    if let Some(path) = &outputs.json {
        write_json(path, report).with_context(|| format!("Failed to write '{}'", path.display()))?;
    }
    if let Some(path) = &outputs.csv {
        write_csv(path, report).with_context(|| format!("Failed to write '{}'", path.display()))?;
    }
    if !outputs.no_chart {
        let chart = Chart::from_report(report, &config.chart);
        render_chart(&chart, &config.chart)
            .with_context(|| format!("Failed to render chart '{}'", config.chart.output.display()))?;
    }
    Ok(())
}

fn print_presets(name: Option<Preset>) -> anyhow::Result<()> {
    match name {
        Some(preset) => {
            let text = preset.config().to_toml_string()?;
            print!("{}", text);
        }
        None => {
            for preset in Preset::ALL {
                println!("{:<10} {}", preset.name(), preset.description());
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let CliArgs { command } = CliArgs::parse();
    match command {
        Commands::Run { selection, outputs } => run_benchmark(&selection, &outputs),
        Commands::Plan { selection } => print_plan(&selection),
        Commands::Report {
            dir,
            pattern,
            selection,
            outputs,
        } => report_recorded(&dir, &pattern, &selection, &outputs),
        Commands::Presets { name } => print_presets(name),
    }
}
