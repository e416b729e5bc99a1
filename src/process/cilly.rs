//! Simplifying C sources with CIL.

use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, info, warn};
use thiserror::Error;

use super::{OutputHandler, ProcessError, ProcessExecutor, MAX_ERROR_OUTPUT_SHOWN};

#[derive(Debug, Error)]
pub enum CillyError {
    #[error("could not run CIL")]
    Io(#[from] io::Error),
    #[error("CIL was terminated by a signal")]
    Terminated,
    /// `stderr` holds at most [`MAX_ERROR_OUTPUT_SHOWN`] lines.
    #[error("CIL failed with exit code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
}

impl From<ProcessError<CillyError>> for CillyError {
    fn from(e: ProcessError<CillyError>) -> Self {
        match e {
            ProcessError::Io(e) => CillyError::Io(e),
            ProcessError::Handler(e) => e,
            ProcessError::Terminated { .. } => CillyError::Terminated,
        }
    }
}

#[derive(Debug, Default)]
struct CillyOutput {
    stderr: Vec<String>,
    error_output_count: usize,
}

impl OutputHandler for CillyOutput {
    type Error = CillyError;

    fn handle_output(&mut self, line: &str) -> Result<(), CillyError> {
        debug!("cilly: {line}");
        Ok(())
    }

    fn handle_error_output(&mut self, line: &str) -> Result<(), CillyError> {
        self.error_output_count += 1;
        if self.error_output_count <= MAX_ERROR_OUTPUT_SHOWN {
            self.stderr.push(line.to_string());
        } else if self.error_output_count == MAX_ERROR_OUTPUT_SHOWN + 1 {
            warn!("cilly: further error output suppressed");
        }
        Ok(())
    }

    fn handle_exit_code(&mut self, code: i32) -> Result<(), CillyError> {
        if code == 0 {
            return Ok(());
        }
        Err(CillyError::Failed {
            code,
            stderr: self.stderr.join("\n"),
        })
    }
}

/// Invocation of the CIL driver.
#[derive(Clone, Debug)]
pub struct Cilly {
    executable: PathBuf,
    simple_mem: bool,
}

impl Default for Cilly {
    fn default() -> Self {
        Cilly {
            executable: PathBuf::from("cilly.asm.exe"),
            simple_mem: false,
        }
    }
}

impl Cilly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executable(self, executable: impl Into<PathBuf>) -> Self {
        Cilly {
            executable: executable.into(),
            ..self
        }
    }

    /// Also pass `--dosimpleMem`, which splits complex memory accesses.
    pub fn simple_mem(self, simple_mem: bool) -> Self {
        Cilly { simple_mem, ..self }
    }

    pub fn command(&self, source: &Path, target: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(["--dosimplify", "--printCilAsIs", "--domakeCFG"]);
        if self.simple_mem {
            cmd.arg("--dosimpleMem");
        }
        cmd.arg("--out").arg(target).arg(source);
        cmd
    }

    /// Simplifies `source` into `target` and waits for CIL to finish.
    pub fn run(&self, source: &Path, target: &Path) -> Result<(), CillyError> {
        info!("simplifying {} with CIL", source.display());
        let mut exec =
            ProcessExecutor::spawn(self.command(source, target), CillyOutput::default())?;
        exec.join()?;
        Ok(())
    }
}
