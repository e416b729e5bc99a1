//! # External Processes
//!
//! [`ProcessExecutor`] runs an external tool and feeds its output, line by
//! line, to an [`OutputHandler`]. Standard output and standard error are
//! drained on two reader threads while the caller waits in
//! [`ProcessExecutor::join`]; the handler sits behind a mutex so both readers
//! and the exit-code callback see a consistent state.
//!
//! Lines are split on `\n` and decoded lossily, so tools that print bytes
//! outside UTF-8 still have their whole output delivered.
//!
//! There is no timeout. A caller that needs one waits for `join` on its own
//! thread. Dropping an executor that was never joined kills and reaps the
//! child.

use std::{
    io::{self, BufRead, BufReader, Read},
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use log::{debug, warn};
use thiserror::Error;

pub mod cbmc;
pub mod cilly;

/// Error lines a tool wrapper keeps and logs before further error output is
/// suppressed.
pub const MAX_ERROR_OUTPUT_SHOWN: usize = 10;

/// Receives the output of a running process.
pub trait OutputHandler: Send + 'static {
    type Error: std::error::Error + Send + 'static;

    fn handle_output(&mut self, _line: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn handle_error_output(&mut self, _line: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn handle_exit_code(&mut self, _code: i32) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ProcessError<E> {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Handler(E),
    #[error("{program} was terminated by a signal")]
    Terminated { program: String },
}

type Reader<E> = JoinHandle<Result<(), ProcessError<E>>>;

pub struct ProcessExecutor<H: OutputHandler> {
    program: String,
    child: Child,
    handler: Arc<Mutex<H>>,
    readers: Vec<Reader<H::Error>>,
    finished: bool,
}

fn lock<H>(handler: &Mutex<H>) -> std::sync::MutexGuard<'_, H> {
    handler.lock().unwrap_or_else(PoisonError::into_inner)
}

fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Reads `stream` to the end. After the first handler error the rest of the
/// stream is still drained so the child never blocks on a full pipe. Only a
/// failing read stops the reader early.
fn spawn_reader<H: OutputHandler>(
    name: String,
    stream: impl Read + Send + 'static,
    handler: Arc<Mutex<H>>,
    handle: fn(&mut H, &str) -> Result<(), H::Error>,
) -> io::Result<Reader<H::Error>> {
    thread::Builder::new().name(name).spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let mut first_error = None;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            if first_error.is_none() {
                let line = String::from_utf8_lossy(&buf);
                if let Err(e) = handle(&mut lock(&handler), trim_line_ending(&line)) {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), |e| Err(ProcessError::Handler(e)))
    })
}

impl<H: OutputHandler> ProcessExecutor<H> {
    /// Starts `command` with piped output. Failing to start the process is
    /// reported as the plain I/O error.
    pub fn spawn(mut command: Command, handler: H) -> io::Result<Self> {
        let program = command.get_program().to_string_lossy().into_owned();
        debug!("executing {command:?}");

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let handler = Arc::new(Mutex::new(handler));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(
                format!("{program} stdout"),
                stdout,
                Arc::clone(&handler),
                H::handle_output,
            )?);
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(
                format!("{program} stderr"),
                stderr,
                Arc::clone(&handler),
                H::handle_error_output,
            )?);
        }

        Ok(ProcessExecutor {
            program,
            child,
            handler,
            readers,
            finished: false,
        })
    }

    /// Waits for the process and both readers, then reports the exit code to
    /// the handler. Returns the first error any of them produced.
    ///
    /// # Panics
    /// If called twice.
    pub fn join(&mut self) -> Result<(), ProcessError<H::Error>> {
        assert!(!self.finished, "{} was already joined", self.program);
        let status = self.child.wait();
        self.finished = true;

        let mut result = Ok(());
        for reader in self.readers.drain(..) {
            let outcome = reader
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            if result.is_ok() {
                result = outcome;
            }
        }
        let status = status?;
        result?;

        let code = status.code().ok_or_else(|| ProcessError::Terminated {
            program: self.program.clone(),
        })?;
        debug!("{} exited with code {code}", self.program);
        lock(&self.handler)
            .handle_exit_code(code)
            .map_err(ProcessError::Handler)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn with_handler<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut lock(&self.handler))
    }
}

impl<H: OutputHandler> Drop for ProcessExecutor<H> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("{} dropped before it was joined, killing it", self.program);
        // fails only if the child already exited, wait still reaps it
        let _ = self.child.kill();
        if let Err(e) = self.child.wait() {
            warn!("could not reap {}: {e}", self.program);
        }
    }
}

#[cfg(all(test, unix))]
mod test {
    use test_log::test;

    use super::*;

    #[derive(Debug, Default)]
    struct Transcript {
        out: Vec<String>,
        err: Vec<String>,
        code: Option<i32>,
    }

    #[derive(Debug, Error)]
    #[error("refused {0:?}")]
    struct Refused(String);

    impl OutputHandler for Transcript {
        type Error = Refused;

        fn handle_output(&mut self, line: &str) -> Result<(), Refused> {
            if line == "poison" {
                return Err(Refused(line.to_string()));
            }
            self.out.push(line.to_string());
            Ok(())
        }

        fn handle_error_output(&mut self, line: &str) -> Result<(), Refused> {
            self.err.push(line.to_string());
            Ok(())
        }

        fn handle_exit_code(&mut self, code: i32) -> Result<(), Refused> {
            self.code = Some(code);
            Ok(())
        }
    }

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn both_streams_and_exit_code_reach_the_handler() {
        let mut exec =
            ProcessExecutor::spawn(sh("echo a; echo b >&2; echo c; exit 3"), Transcript::default())
                .unwrap();
        assert!(!exec.is_finished());
        exec.join().unwrap();
        assert!(exec.is_finished());
        exec.with_handler(|t| {
            assert_eq!(t.out, ["a", "c"]);
            assert_eq!(t.err, ["b"]);
            assert_eq!(t.code, Some(3));
        });
    }

    #[test]
    fn first_handler_error_is_returned() {
        let mut exec = ProcessExecutor::spawn(
            sh("echo ok; echo poison; echo after"),
            Transcript::default(),
        )
        .unwrap();
        let err = exec.join().unwrap_err();
        assert!(matches!(err, ProcessError::Handler(Refused(ref l)) if l == "poison"));
        exec.with_handler(|t| assert_eq!(t.code, None));
    }

    #[test]
    fn spawn_failure_is_an_io_error() {
        let err = ProcessExecutor::spawn(
            Command::new("/nonexistent/definitely-not-a-tool"),
            Transcript::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn killed_process_is_terminated() {
        let mut exec = ProcessExecutor::spawn(sh("kill -9 $$"), Transcript::default()).unwrap();
        assert!(matches!(exec.join(), Err(ProcessError::Terminated { .. })));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        // the large tail must still be drained after the bad line
        let mut exec = ProcessExecutor::spawn(
            sh("printf 'a\\377b\\r\\n'; head -c 2000000 /dev/zero | tr '\\0' x; echo; echo end"),
            Transcript::default(),
        )
        .unwrap();
        exec.join().unwrap();
        exec.with_handler(|t| {
            assert_eq!(t.out[0], "a\u{fffd}b");
            assert_eq!(t.out[1].len(), 2_000_000);
            assert_eq!(t.out.last().map(String::as_str), Some("end"));
            assert_eq!(t.code, Some(0));
        });
    }

    #[test]
    fn dropping_an_unjoined_executor_reaps_the_child() {
        let exec = ProcessExecutor::spawn(sh("exec sleep 30"), Transcript::default()).unwrap();
        let pid = exec.child.id().to_string();
        drop(exec);
        let alive = Command::new("kill").args(["-0", &pid]).status().unwrap();
        assert!(!alive.success(), "process {pid} still exists");
    }

    #[test]
    #[should_panic(expected = "already joined")]
    fn join_twice_panics() {
        let mut exec = ProcessExecutor::spawn(sh("true"), Transcript::default()).unwrap();
        exec.join().unwrap();
        let _ = exec.join();
    }
}
