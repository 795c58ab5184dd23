//! Runs the worker repeatedly and gathers its stdout into one intermediate
//! measurement file per (workload, parallelism) configuration.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use crate::error::{BenchError, Result};
use crate::worker::{Invocation, Parallelism};

/// Launches one trial of the worker with its stdout bound to `stdout`.
///
/// Implementations block until the trial has finished writing.
pub trait TrialRunner {
    fn run_trial(&self, invocation: &Invocation, stdout: File) -> Result<()>;
}

impl<T: TrialRunner + ?Sized> TrialRunner for &T {
    fn run_trial(&self, invocation: &Invocation, stdout: File) -> Result<()> {
        (**self).run_trial(invocation, stdout)
    }
}

/// Runs trials as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl TrialRunner for CommandRunner {
    fn run_trial(&self, invocation: &Invocation, stdout: File) -> Result<()> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::inherit());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|source| BenchError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        // Output is what counts; a bad exit only shows up when the line fails to parse.
        if !status.success() {
            warn!(command = %invocation, %status, "worker exited unsuccessfully");
        }
        Ok(())
    }
}

/// Intermediate file holding one measurement per line.
///
/// The file is removed when this value is dropped, whether or not the
/// samples were read successfully.
#[derive(Debug)]
pub struct MeasurementFile {
    file: NamedTempFile,
}

impl MeasurementFile {
    pub fn create(work_dir: &Path, workload: &str, parallelism: Parallelism) -> Result<Self> {
        let prefix = format!("{}{}-", workload, parallelism.file_tag());
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".txt")
            .tempfile_in(work_dir)
            .map_err(|e| BenchError::io(work_dir, e))?;
        trace!(path = %file.path().display(), "created measurement file");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Fresh append-mode handle, so successive trials never overwrite each other.
    pub fn append_handle(&self) -> Result<File> {
        OpenOptions::new()
            .append(true)
            .open(self.path())
            .map_err(|e| BenchError::io(self.path(), e))
    }
}

/// Runs `trials` invocations, each appending its stdout to `file`.
pub fn collect_trials<R: TrialRunner>(
    runner: &R,
    invocation: &Invocation,
    trials: usize,
    file: &MeasurementFile,
) -> Result<()> {
    for trial in 1..=trials {
        debug!(trial, trials, command = %invocation, "running trial");
        runner.run_trial(invocation, file.append_handle()?)?;
    }
    Ok(())
}
