//! Counterexample checking with CBMC.
//!
//! CBMC exits with 0 when the program it was given is safe (so the
//! counterexample is infeasible) and with 10 when it found a violation (the
//! counterexample is feasible).

use std::{path::Path, process::Command};

use log::{trace, warn};
use thiserror::Error;

use super::{OutputHandler, ProcessError, ProcessExecutor, MAX_ERROR_OUTPUT_SHOWN};

const EXIT_SAFE: i32 = 0;
const EXIT_VIOLATION: i32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CounterexampleAnalysisFailed {
    #[error("CBMC ran out of memory")]
    OutOfMemory,
    #[error("CBMC exited with unexpected code {code}")]
    UnexpectedExitCode { code: i32 },
}

fn is_benign(line: &str) -> bool {
    (line.starts_with("Verified ") && line.ends_with("original clauses."))
        || line.starts_with("**** WARNING: no body for function")
}

/// Output handler tracking what CBMC reported.
#[derive(Debug, Default)]
pub struct CbmcOutput {
    feasible: Option<bool>,
    error_output_count: usize,
    error_lines: Vec<String>,
    unwinding_assertion_failed: bool,
}

impl CbmcOutput {
    /// The first error lines, at most [`MAX_ERROR_OUTPUT_SHOWN`].
    pub fn error_lines(&self) -> &[String] {
        &self.error_lines
    }

    pub fn error_output_count(&self) -> usize {
        self.error_output_count
    }
}

impl OutputHandler for CbmcOutput {
    type Error = CounterexampleAnalysisFailed;

    fn handle_output(&mut self, line: &str) -> Result<(), Self::Error> {
        trace!("cbmc: {line}");
        if line.contains("unwinding assertion") {
            self.unwinding_assertion_failed = true;
        }
        Ok(())
    }

    fn handle_error_output(&mut self, line: &str) -> Result<(), Self::Error> {
        if is_benign(line) {
            return Ok(());
        }
        if line.to_ascii_lowercase().contains("out of memory") {
            return Err(CounterexampleAnalysisFailed::OutOfMemory);
        }

        self.error_output_count += 1;
        match self.error_output_count {
            n if n <= MAX_ERROR_OUTPUT_SHOWN => {
                warn!("cbmc: {line}");
                self.error_lines.push(line.to_string());
            }
            n if n == MAX_ERROR_OUTPUT_SHOWN + 1 => {
                warn!("cbmc: further error output suppressed");
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_exit_code(&mut self, code: i32) -> Result<(), Self::Error> {
        self.feasible = match code {
            EXIT_SAFE => Some(false),
            EXIT_VIOLATION => Some(true),
            code => return Err(CounterexampleAnalysisFailed::UnexpectedExitCode { code }),
        };
        Ok(())
    }
}

pub struct CbmcExecutor {
    exec: ProcessExecutor<CbmcOutput>,
}

impl CbmcExecutor {
    /// Runs `<lib_path>/cbmc` with `args`.
    pub fn spawn<I, S>(lib_path: impl AsRef<Path>, args: I) -> std::io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(lib_path.as_ref().join("cbmc"));
        cmd.args(args);
        Self::with_command(cmd)
    }

    /// Runs an arbitrary command whose output and exit codes follow CBMC's
    /// conventions.
    pub fn with_command(mut command: Command) -> std::io::Result<Self> {
        command.env("LANG", "C");
        Ok(CbmcExecutor {
            exec: ProcessExecutor::spawn(command, CbmcOutput::default())?,
        })
    }

    pub fn join(&mut self) -> Result<(), ProcessError<CounterexampleAnalysisFailed>> {
        self.exec.join()
    }

    pub fn is_finished(&self) -> bool {
        self.exec.is_finished()
    }

    /// Whether the counterexample is feasible. `None` when CBMC printed
    /// unexpected error output; the error count is reset, so asking again
    /// yields the exit-code verdict.
    ///
    /// # Panics
    /// If the process was not joined yet.
    pub fn result(&mut self) -> Option<bool> {
        assert!(self.exec.is_finished(), "CBMC has not finished yet");
        self.exec.with_handler(|out| {
            if out.error_output_count > 0 {
                warn!(
                    "CBMC produced {} line(s) of unexpected error output, result is unknown",
                    out.error_output_count
                );
                out.error_output_count = 0;
                None
            } else {
                out.feasible
            }
        })
    }

    pub fn did_unwinding_assertion_fail(&self) -> bool {
        self.exec.with_handler(|out| out.unwinding_assertion_failed)
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.exec.with_handler(|out| out.error_lines.clone())
    }
}
