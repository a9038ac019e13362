//! The probe client: one file in, one [`ProbeResult`] (or one error) out.
//!
//! A [`ProbeClient`] owns an immutable [`ProbeConfig`] and is cheap to clone.
//! Per-call [`ProbeOptions`] override the configuration for a single call.
//! Every call style (async, blocking, batch) goes through
//! [`ProbeClient::probe_with`], so they classify outcomes identically.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mediaprobe_core::{Error, OutputFormat, ProbeConfig, ProbeResult, Result};
use mediaprobe_parser::{extract_error, parse_output};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::command::{block_on, ToolCommand, ToolOutput};
use crate::tools::{resolve_ffprobe, tool_name};

/// Flags requesting every section the parser understands, with banner and
/// log noise suppressed. `-print_format` and the input path follow.
const PROBE_FLAGS: &[&str] = &[
    "-hide_banner",
    "-loglevel",
    "fatal",
    "-show_error",
    "-show_format",
    "-show_streams",
    "-show_programs",
    "-show_chapters",
    "-show_private_data",
];

/// Build the full argument vector for probing `path`.
///
/// The path is the last argument and is passed through unmodified.
pub fn probe_args(format: OutputFormat, path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = PROBE_FLAGS.iter().map(OsString::from).collect();
    args.push("-print_format".into());
    args.push(format.writer_name().into());
    args.push(path.as_os_str().to_os_string());
    args
}

/// Per-call overrides. Unset fields fall back to the client's config.
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    pub ffprobe_path: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl ProbeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe_path = Some(path.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Probes media files by running the probe executable.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    config: Arc<ProbeConfig>,
    ffprobe: Arc<PathBuf>,
}

impl Default for ProbeClient {
    fn default() -> Self {
        Self::new(ProbeConfig::default())
    }
}

impl ProbeClient {
    /// Create a client. The executable is resolved once, here.
    pub fn new(config: ProbeConfig) -> Self {
        let ffprobe = resolve_ffprobe(config.ffprobe_path.as_deref());
        tracing::debug!(ffprobe = %ffprobe.display(), "probe client ready");
        Self {
            config: Arc::new(config),
            ffprobe: Arc::new(ffprobe),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// The executable used when no per-call override is given.
    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    /// Probe one file with the client's configuration.
    pub async fn probe(&self, path: impl AsRef<Path>) -> Result<ProbeResult> {
        self.probe_with(path, &ProbeOptions::default()).await
    }

    /// Probe one file, with `options` taking precedence over the config.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if the executable cannot be started.
    /// - [`Error::ProbeFailure`] if it exits non-zero.
    /// - [`Error::Parse`] if its output cannot be interpreted.
    /// - [`Error::Timeout`] / [`Error::Cancelled`] if the run is cut short.
    pub async fn probe_with(
        &self,
        path: impl AsRef<Path>,
        options: &ProbeOptions,
    ) -> Result<ProbeResult> {
        let path = path.as_ref();
        let format = options.output_format.unwrap_or(self.config.output_format);
        let command = self.command(path, format, options);

        let output = command.output().await?;
        interpret(command.program(), path, format, output)
    }

    /// Blocking form of [`probe`](Self::probe).
    pub fn probe_blocking(&self, path: impl AsRef<Path>) -> Result<ProbeResult> {
        self.probe_blocking_with(path, &ProbeOptions::default())
    }

    /// Blocking form of [`probe_with`](Self::probe_with).
    pub fn probe_blocking_with(
        &self,
        path: impl AsRef<Path>,
        options: &ProbeOptions,
    ) -> Result<ProbeResult> {
        block_on(self.probe_with(path.as_ref(), options))
    }

    /// Probe many files, returning one result per path in input order.
    ///
    /// At most `max_concurrent` probe processes run at once; with the
    /// default of 1 the files are probed strictly one after another. A
    /// failed probe never stops the others.
    pub async fn probe_many<I, P>(
        &self,
        paths: I,
        options: &ProbeOptions,
    ) -> Vec<(PathBuf, Result<ProbeResult>)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut handles = Vec::new();

        for path in paths {
            let path = path.as_ref().to_path_buf();

            // Permits are taken here rather than in the task so processes
            // launch in input order.
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let client = self.clone();
            let options = options.clone();
            let task_path = path.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                client.probe_with(&task_path, &options).await
            });
            handles.push((path, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (path, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Internal(format!("probe task failed: {e}"))),
            };
            if let Err(e) = &result {
                tracing::warn!(path = %path.display(), "probe failed: {e}");
            }
            results.push((path, result));
        }
        results
    }

    fn command(&self, path: &Path, format: OutputFormat, options: &ProbeOptions) -> ToolCommand {
        let program = options
            .ffprobe_path
            .clone()
            .unwrap_or_else(|| self.ffprobe.to_path_buf());

        let mut command = ToolCommand::new(program);
        command
            .args(probe_args(format, path))
            .timeout(options.timeout.unwrap_or_else(|| self.config.timeout()));
        if let Some(token) = &options.cancel {
            command.cancel_token(token.clone());
        }
        command
    }
}

/// Classify a finished run and parse its output.
fn interpret(
    program: &Path,
    path: &Path,
    format: OutputFormat,
    output: ToolOutput,
) -> Result<ProbeResult> {
    let tool = tool_name(program);

    if !output.success() {
        // With -show_error the tool also prints an error section on stdout.
        let detail = extract_error(format, &String::from_utf8_lossy(&output.stdout))
            .and_then(|section| section.message);
        return Err(output.into_failure(tool, detail));
    }

    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        tracing::debug!(tool = %tool, path = %path.display(), stderr, "diagnostics on success");
    }

    let parsed = parse_output(format, output.stdout_text(format)?)?;
    let result = ProbeResult::assemble(path, parsed, output.elapsed);
    tracing::debug!(
        path = %path.display(),
        streams = result.streams.count(),
        probe_time_ms = result.probe_time.as_millis() as u64,
        "probed"
    );
    Ok(result)
}
