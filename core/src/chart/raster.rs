use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BenchError, Result};

/// Hands `svg` to an external converter. `command` is the program followed by
/// its arguments; `{input}` and `{output}` are replaced with the SVG temp file
/// and `output`.
pub(super) fn rasterize(svg: &str, output: &Path, command: &[String]) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| BenchError::config("chart.rasterizer is empty"))?;

    let mut input = tempfile::Builder::new()
        .prefix("speedup-chart-")
        .suffix(".svg")
        .tempfile()
        .map_err(|e| BenchError::io(std::env::temp_dir(), e))?;
    write_input(&mut input, svg)?;

    let input_path = input.path().to_string_lossy().into_owned();
    let output_path = output.to_string_lossy().into_owned();
    let args: Vec<String> = args
        .iter()
        .map(|arg| arg.replace("{input}", &input_path).replace("{output}", &output_path))
        .collect();

    debug!(program = %program, ?args, "running rasterizer");
    let status = Command::new(program)
        .args(&args)
        .status()
        .map_err(|source| BenchError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !status.success() {
        return Err(BenchError::Rasterize {
            program: program.clone(),
            status: status.to_string(),
        });
    }
    Ok(())
}

fn write_input(file: &mut NamedTempFile, svg: &str) -> Result<()> {
    file.write_all(svg.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| BenchError::io(file.path(), e))
}
