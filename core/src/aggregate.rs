use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{BenchError, Result};

/// Reads exactly `trials` lines from `reader` and returns their mean.
///
/// Lines beyond `trials` are ignored. `path` only labels errors.
pub fn aggregate_reader<R: BufRead>(mut reader: R, trials: usize, path: &Path) -> Result<f64> {
    if trials == 0 {
        return Err(BenchError::config("cannot aggregate zero trials"));
    }

    let mut total = 0.0;
    let mut line = String::new();
    for index in 0..trials {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|e| BenchError::io(path, e))?;
        if read == 0 {
            return Err(BenchError::MissingSamples {
                path: path.to_path_buf(),
                expected: trials,
                found: index,
            });
        }
        let text = line.trim();
        let sample: f64 = text.parse().map_err(|_| BenchError::InvalidSample {
            path: path.to_path_buf(),
            line: index + 1,
            content: text.to_string(),
        })?;
        total += sample;
    }
    Ok(total / trials as f64)
}

pub fn aggregate_file(path: &Path, trials: usize) -> Result<f64> {
    let file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    aggregate_reader(BufReader::new(file), trials, path)
}
