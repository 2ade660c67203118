//! Runs workers as child processes: `<interpreter> <script> <json payload>`.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{CALCULATIONS_DIR_ENV, PYTHON_ENV, WorkerConfig};
use crate::failure::{Diagnostic, Failure, FailureKind};
use crate::types::WorkerId;
use crate::worker::{WorkerCall, WorkerInvoker, WorkerOutcome};

/// Spawns one child process per call. Holds no per-call state, so a single
/// instance is shared by all concurrent dispatches.
#[derive(Debug, Clone)]
pub struct SubprocessInvoker {
    config: WorkerConfig,
}

impl SubprocessInvoker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// The project-local interpreter if it exists right now, else the
    /// system one. Re-checked on every call so a fresh install is picked up
    /// without a restart.
    pub fn resolve_interpreter(&self) -> PathBuf {
        let local = self
            .config
            .calculations_dir
            .join(&self.config.local_interpreter);
        if local.exists() {
            local
        } else {
            PathBuf::from(&self.config.fallback_interpreter)
        }
    }

    pub fn script_path(&self, worker: &WorkerId) -> PathBuf {
        self.config
            .calculations_dir
            .join(format!("{}.{}", worker, self.config.script_extension))
    }

    async fn run(&self, call: WorkerCall) -> WorkerOutcome {
        let script = self.script_path(&call.worker);
        if !script.is_file() {
            return WorkerOutcome::failure(
                FailureKind::WorkerNotFound,
                format!(
                    "Worker script not found: {}\n\
                     Make sure the calculations directory exists, or point {} at it.",
                    script.display(),
                    CALCULATIONS_DIR_ENV
                ),
            );
        }

        let interpreter = self.resolve_interpreter();
        let payload = match serde_json::to_string(&call.payload) {
            Ok(payload) => payload,
            Err(e) => {
                return WorkerOutcome::failure(
                    FailureKind::Internal,
                    format!("Failed to encode worker payload: {}", e),
                );
            }
        };

        info!(
            worker = %call.worker,
            action = %call.action,
            interpreter = %interpreter.display(),
            script = %script.display(),
            cwd = %self.config.calculations_dir.display(),
            "Calling worker"
        );

        let mut command = Command::new(&interpreter);
        command
            .arg(&script)
            .arg(&payload)
            .current_dir(&self.config.calculations_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return WorkerOutcome::failure(
                    FailureKind::SpawnError,
                    format!(
                        "Failed to spawn worker process:\n{}\n\n\
                         Tried to run: {}\n\
                         Make sure Python 3.x is installed and in your PATH (or set {}).\n\
                         You can install dependencies with: cd calculations && pip install -r requirements.txt",
                        e,
                        interpreter.display(),
                        PYTHON_ENV
                    ),
                );
            }
        };

        let started = Instant::now();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        // Exit status and both pipes must all be finished before the
        // outcome is decided; draining concurrently keeps a chatty worker
        // from blocking on a full pipe.
        let collect = async {
            let (status, stdout, stderr) =
                tokio::join!(child.wait(), drain(stdout_pipe), drain(stderr_pipe));
            Ok::<_, io::Error>((status?, stdout?, stderr?))
        };
        let collected = tokio::time::timeout(self.config.timeout, collect).await;

        let (status, stdout, stderr) = match collected {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => {
                if let Err(kill_err) = child.kill().await {
                    warn!(worker = %call.worker, "Failed to kill worker: {}", kill_err);
                }
                return WorkerOutcome::failure(
                    FailureKind::Internal,
                    format!("I/O error while waiting for worker `{}`: {}", call.worker, e),
                );
            }
            Err(_) => {
                if let Err(kill_err) = child.kill().await {
                    warn!(worker = %call.worker, "Failed to kill timed-out worker: {}", kill_err);
                }
                warn!(
                    worker = %call.worker,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Worker timed out and was killed"
                );
                return WorkerOutcome::failure(
                    FailureKind::Timeout,
                    format!(
                        "Worker `{}` timed out after {} ms and was terminated",
                        call.worker,
                        self.config.timeout.as_millis()
                    ),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        debug!(
            worker = %call.worker,
            exit_code = ?status.code(),
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Worker exited"
        );

        if !status.success() {
            let diagnostic = Diagnostic {
                exit_code: status.code(),
                script_path: script,
                interpreter_path: interpreter,
                payload: call.payload,
            };
            warn!(
                worker = %call.worker,
                exit_code = ?diagnostic.exit_code,
                script = %diagnostic.script_path.display(),
                interpreter = %diagnostic.interpreter_path.display(),
                payload = %payload,
                "Worker failed"
            );

            let message = if stderr.trim().is_empty() {
                match status.code() {
                    Some(code) => format!("Worker exited with status {} and no error output", code),
                    None => "Worker was terminated by a signal with no error output".to_string(),
                }
            } else {
                stderr
            };
            return WorkerOutcome::Failure(
                Failure::new(FailureKind::WorkerError, message).with_diagnostic(diagnostic),
            );
        }

        match serde_json::from_str::<Value>(&stdout) {
            Ok(value) => WorkerOutcome::Success(value),
            Err(e) => WorkerOutcome::failure(
                FailureKind::MalformedOutput,
                format!(
                    "Failed to parse worker output as JSON:\n{}\n\nParse error: {}",
                    stdout, e
                ),
            ),
        }
    }
}

#[async_trait]
impl WorkerInvoker for SubprocessInvoker {
    async fn invoke(&self, call: WorkerCall) -> WorkerOutcome {
        self.run(call).await
    }
}

/// Read a pipe to EOF, keeping every byte.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
