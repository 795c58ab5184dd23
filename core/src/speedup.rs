use std::fmt;

use serde::Serialize;
use tracing::warn;

/// Ratio of the baseline aggregate to a parallel aggregate.
///
/// A zero, infinite or NaN outcome is kept as `Undefined` rather than being
/// passed along as a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speedup {
    Ratio(f64),
    Undefined { baseline: f64, parallel: f64 },
}

impl Speedup {
    pub fn compute(baseline: f64, parallel: f64) -> Self {
        let ratio = baseline / parallel;
        if ratio.is_finite() && ratio != 0.0 {
            Speedup::Ratio(ratio)
        } else {
            Speedup::Undefined { baseline, parallel }
        }
    }

    pub fn ratio(self) -> Option<f64> {
        match self {
            Speedup::Ratio(r) => Some(r),
            Speedup::Undefined { .. } => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Speedup::Ratio(_))
    }
}

impl fmt::Display for Speedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speedup::Ratio(r) => write!(f, "{:.2}", r),
            Speedup::Undefined { .. } => write!(f, "undefined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedupPoint {
    pub threads: u32,
    /// Aggregate elapsed time at `threads`.
    pub parallel: f64,
    pub speedup: Speedup,
}

/// Builds the series for one workload, keeping the order of `measurements`.
pub fn speedup_series(baseline: f64, measurements: &[(u32, f64)]) -> Vec<SpeedupPoint> {
    measurements
        .iter()
        .map(|&(threads, parallel)| {
            let speedup = Speedup::compute(baseline, parallel);
            if !speedup.is_defined() {
                warn!(threads, baseline, parallel, "speedup is undefined for this measurement");
            }
            SpeedupPoint {
                threads,
                parallel,
                speedup,
            }
        })
        .collect()
}
