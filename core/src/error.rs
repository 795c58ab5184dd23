use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while measuring, aggregating or reporting a benchmark run.
#[derive(Debug)]
pub enum BenchError {
    /// Filesystem failure on an intermediate file, report or chart.
    Io { path: PathBuf, source: io::Error },
    /// The worker (or rasterizer) could not be launched at all.
    Spawn { program: String, source: io::Error },
    /// A measurement file ended before the expected number of samples.
    MissingSamples { path: PathBuf, expected: usize, found: usize },
    /// A measurement line could not be parsed as a float.
    InvalidSample { path: PathBuf, line: usize, content: String },
    InvalidConfig(String),
    Rasterize { program: String, status: String },
    UnsupportedChartFormat(PathBuf),
    Serialize(String),
}

impl BenchError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        BenchError::InvalidConfig(message.into())
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
            BenchError::Spawn { program, source } => write!(f, "failed to launch '{}': {}", program, source),
            BenchError::MissingSamples { path, expected, found } => write!(
                f,
                "{} ended after {} of {} expected samples",
                path.display(),
                found,
                expected
            ),
            BenchError::InvalidSample { path, line, content } => write!(
                f,
                "{}:{}: expected a numeric measurement, found '{}'",
                path.display(),
                line,
                content
            ),
            BenchError::InvalidConfig(message) => write!(f, "invalid configuration: {}", message),
            BenchError::Rasterize { program, status } => {
                write!(f, "rasterizer '{}' exited with {}", program, status)
            }
            BenchError::UnsupportedChartFormat(path) => write!(
                f,
                "cannot render {} without a rasterizer; use a .svg path or set chart.rasterizer",
                path.display()
            ),
            BenchError::Serialize(message) => write!(f, "failed to serialize report: {}", message),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Io { source, .. } | BenchError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
