//! Builder for running external tools with timeout and cancellation.
//!
//! [`ToolCommand::output`] is the one subprocess primitive in the crate. The
//! blocking variants drive the same future to completion on the calling
//! thread.

use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use mediaprobe_core::{Error, OutputFormat, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;

use crate::tools::tool_name;

/// Default command timeout: 5 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a finished tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output, undecoded.
    pub stdout: Vec<u8>,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Time from spawn until both pipes closed and the process exited.
    pub elapsed: Duration,
}

impl ToolOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Standard output decoded as strict UTF-8.
    ///
    /// Invalid UTF-8 is a [`Error::Parse`] carrying the lossy text, since the
    /// output is unusable for a parser of `format`.
    pub fn stdout_text(&self, format: OutputFormat) -> Result<&str> {
        std::str::from_utf8(&self.stdout).map_err(|e| {
            Error::parse(
                format,
                format!("output is not valid UTF-8: {e}"),
                String::from_utf8_lossy(&self.stdout),
            )
        })
    }

    /// Convert a non-zero exit into [`Error::ProbeFailure`].
    pub fn into_failure(self, tool: impl Into<String>, detail: Option<String>) -> Error {
        Error::probe_failure(tool, self.status.code(), self.stderr, detail)
    }
}

/// A builder for constructing and running external tool invocations.
///
/// Arguments are passed to the process verbatim; nothing is quoted or
/// interpreted by a shell.
///
/// # Example
///
/// ```no_run
/// use mediaprobe_av::ToolCommand;
///
/// # async fn example() -> mediaprobe_core::Result<()> {
/// let output = ToolCommand::new("ffprobe")
///     .args(["-hide_banner", "-show_format", "-print_format", "json"])
///     .arg("/path/to/song.mp3")
///     .execute()
///     .await?;
/// println!("{}", String::from_utf8_lossy(&output.stdout));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

enum Outcome {
    Finished(Result<(Vec<u8>, Vec<u8>, ExitStatus)>),
    TimedOut,
    Cancelled,
}

impl ToolCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Terminate the process when `token` is cancelled.
    pub fn cancel_token(&mut self, token: CancellationToken) -> &mut Self {
        self.cancel = Some(token);
        self
    }

    /// The program to run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The argument vector, excluding the program.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Run the command and capture its output, whatever the exit status.
    ///
    /// Completes only once stdout and stderr have both reached end of file
    /// and the process has exited.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if the process cannot be started or its pipes fail.
    /// - [`Error::Timeout`] if the deadline passes; the process is killed.
    /// - [`Error::Cancelled`] if the token fires; the process is killed.
    pub async fn output(&self) -> Result<ToolOutput> {
        let tool = tool_name(&self.program);

        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::cancelled(tool));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(tool = %tool, args = ?self.args, "spawning");
        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| Error::spawn(&tool, e))?;

        let outcome = {
            let finished = collect(&mut child);
            tokio::select! {
                result = finished => Outcome::Finished(result.map_err(|e| Error::spawn(&tool, e))),
                _ = tokio::time::sleep(self.timeout) => Outcome::TimedOut,
                _ = cancelled(self.cancel.as_ref()) => Outcome::Cancelled,
            }
        };

        match outcome {
            Outcome::Finished(result) => {
                let (stdout, stderr, status) = result?;
                let elapsed = started.elapsed();
                tracing::debug!(
                    tool = %tool,
                    status = ?status.code(),
                    stdout_bytes = stdout.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "process exited"
                );
                Ok(ToolOutput {
                    status,
                    stdout,
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    elapsed,
                })
            }
            Outcome::TimedOut => {
                kill(&mut child, &tool).await;
                tracing::warn!(tool = %tool, timeout = ?self.timeout, "process timed out");
                Err(Error::timeout(tool, self.timeout))
            }
            Outcome::Cancelled => {
                kill(&mut child, &tool).await;
                tracing::debug!(tool = %tool, "process cancelled");
                Err(Error::cancelled(tool))
            }
        }
    }

    /// Run the command, treating a non-zero exit as [`Error::ProbeFailure`]
    /// carrying the captured stderr.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let output = self.output().await?;
        if !output.success() {
            return Err(output.into_failure(tool_name(&self.program), None));
        }
        Ok(output)
    }

    /// Blocking form of [`output`](Self::output).
    pub fn output_blocking(&self) -> Result<ToolOutput> {
        block_on(self.output())
    }

    /// Blocking form of [`execute`](Self::execute).
    pub fn execute_blocking(&self) -> Result<ToolOutput> {
        block_on(self.execute())
    }
}

/// Drain both pipes and reap the process.
async fn collect(child: &mut Child) -> std::io::Result<(Vec<u8>, Vec<u8>, ExitStatus)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::try_join!(read_pipe(stdout), read_pipe(stderr), child.wait())
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn kill(child: &mut Child, tool: &str) {
    if let Err(e) = child.kill().await {
        tracing::warn!(tool, "failed to kill process: {e}");
    }
}

/// Drive `fut` to completion on the current thread.
///
/// Inside a multi-threaded runtime the worker is handed off with
/// `block_in_place`. A current-thread runtime cannot be blocked from within,
/// so the future runs on a scoped helper thread with its own runtime; the
/// same happens outside any runtime, minus the helper thread.
pub(crate) fn block_on<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send,
    T: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(fut))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(|| block_on_private(fut))
                .join()
                .unwrap_or_else(|_| Err(Error::Internal("blocking call panicked".into())))
        }),
        Err(_) => block_on_private(fut),
    }
}

fn block_on_private<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("failed to create tokio runtime: {e}")))?;
    rt.block_on(fut)
}
