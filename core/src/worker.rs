use std::fmt;
use std::path::PathBuf;

use crate::config::WorkerConfig;

const WORKLOAD_PLACEHOLDER: &str = "{workload}";
const THREADS_PLACEHOLDER: &str = "{threads}";

/// Degree of parallelism requested from the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parallelism {
    /// Single-threaded reference run.
    Baseline,
    Threads(u32),
}

impl Parallelism {
    pub fn thread_count(self) -> u32 {
        match self {
            Parallelism::Baseline => 1,
            Parallelism::Threads(n) => n,
        }
    }

    /// Tag used in intermediate file names: `S` for the baseline, `<n>T` otherwise.
    pub fn file_tag(self) -> String {
        match self {
            Parallelism::Baseline => "S".to_string(),
            Parallelism::Threads(n) => format!("{}T", n),
        }
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parallelism::Baseline => write!(f, "baseline"),
            Parallelism::Threads(n) => write!(f, "{} threads", n),
        }
    }
}

/// A fully expanded worker command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

impl WorkerConfig {
    pub fn invocation(&self, workload: &str, parallelism: Parallelism) -> Invocation {
        let template = match parallelism {
            Parallelism::Baseline => &self.baseline_args,
            Parallelism::Threads(_) => &self.parallel_args,
        };
        let threads = parallelism.thread_count().to_string();
        let args = self
            .args
            .iter()
            .chain(template.iter())
            .map(|arg| expand(arg, workload, &threads))
            .collect();
        Invocation {
            program: self.program.clone(),
            args,
            cwd: self.cwd.clone(),
        }
    }
}

pub(crate) fn expand(template: &str, workload: &str, threads: &str) -> String {
    template
        .replace(WORKLOAD_PLACEHOLDER, workload)
        .replace(THREADS_PLACEHOLDER, threads)
}
