//! Batch driver: probe a list of files and render the results.
//!
//! A failed file is reported and skipped; it never stops the batch.

use std::path::{Path, PathBuf};

use mediaprobe_av::{ProbeClient, ProbeOptions};
use mediaprobe_core::{ExecutionMode, Fields, ProbeResult, Result};

/// How each successful result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// File name, an underline, then the result as pretty JSON.
    #[default]
    Json,
    /// One line for the file plus one line per stream.
    Summary,
}

/// Outcome of probing a list of files, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(PathBuf, Result<ProbeResult>)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed()
    }
}

/// Probe `files` using the client's configured execution mode.
///
/// Async mode runs up to `max_concurrent` probes at once. Blocking mode
/// probes one file at a time on a blocking thread.
pub async fn probe_files(
    client: &ProbeClient,
    files: &[PathBuf],
    options: &ProbeOptions,
) -> BatchReport {
    let results = match client.config().mode {
        ExecutionMode::Async => client.probe_many(files, options).await,
        ExecutionMode::Blocking => {
            let client = client.clone();
            let files = files.to_vec();
            let options = options.clone();
            match tokio::task::spawn_blocking(move || probe_files_blocking(&client, &files, &options))
                .await
            {
                Ok(report) => return report,
                Err(e) => {
                    tracing::error!("Blocking probe task failed: {e}");
                    Vec::new()
                }
            }
        }
    };
    BatchReport { results }
}

/// Probe `files` one after another with blocking calls.
pub fn probe_files_blocking(
    client: &ProbeClient,
    files: &[PathBuf],
    options: &ProbeOptions,
) -> BatchReport {
    let results = files
        .iter()
        .map(|path| {
            let result = client.probe_blocking_with(path, options);
            if let Err(e) = &result {
                tracing::warn!(path = %path.display(), "probe failed: {e}");
            }
            (path.clone(), result)
        })
        .collect();
    BatchReport { results }
}

/// Render one successful result.
pub fn render(path: &Path, result: &ProbeResult, style: OutputStyle) -> Result<String> {
    match style {
        OutputStyle::Json => {
            let heading = path.display().to_string();
            let underline = "=".repeat(heading.chars().count());
            let json = serde_json::to_string_pretty(result)
                .map_err(|e| mediaprobe_core::Error::Internal(format!("serialize result: {e}")))?;
            Ok(format!("{heading}\n{underline}\n{json}"))
        }
        OutputStyle::Summary => Ok(render_summary(result)),
    }
}

fn render_summary(result: &ProbeResult) -> String {
    let mut out = result.file.clone();

    if let Some(format) = &result.format {
        if let Some(name) = format.format_name() {
            out.push_str(&format!(" [{name}]"));
        }
    }
    if let Some(duration) = result.duration() {
        out.push_str(&format!(" {:.3}s", duration.as_secs_f64()));
    }
    if let Some(title) = result.metadata.format.title() {
        out.push_str(&format!(" \"{title}\""));
    }
    out.push_str(&format!(
        ", {} stream(s), probed in {} ms",
        result.streams.count(),
        result.probe_time.as_millis()
    ));

    for (index, stream) in result.streams.enumerate() {
        out.push_str(&format!(
            "\n  #{index} {} {}",
            stream.codec_type().unwrap_or("unknown"),
            stream.codec_name().unwrap_or("unknown"),
        ));
        match stream.codec_type() {
            Some("video") => {
                if let (Some(w), Some(h)) = (stream.get_u64("width"), stream.get_u64("height")) {
                    out.push_str(&format!(" {w}x{h}"));
                }
            }
            Some("audio") => {
                if let Some(rate) = stream.get_u64("sample_rate") {
                    out.push_str(&format!(" {rate} Hz"));
                }
                if let Some(channels) = stream.get_u64("channels") {
                    out.push_str(&format!(" {channels}ch"));
                }
            }
            _ => {}
        }
        if let Some(lang) = result.stream_metadata(index).and_then(|m| m.language()) {
            out.push_str(&format!(" ({lang})"));
        }
    }

    out
}
