//! Unified error type for mediaprobe.
//!
//! Every probe call surfaces exactly one [`Error`] on failure. The three
//! probe outcomes the caller usually cares about are [`Error::Spawn`] (the
//! process never ran), [`Error::ProbeFailure`] (the process rejected the
//! input) and [`Error::Parse`] (the process succeeded but its output was
//! unusable). None of them are retried internally.

use std::time::Duration;

use crate::config::OutputFormat;

/// Unified error type covering all failure modes in mediaprobe.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS could not start or talk to the probe process.
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        /// Name of the tool that could not be started.
        tool: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The probe process ran and exited with a non-zero status.
    #[error("{tool} exited with {}: {}", display_status(*status), failure_text(stderr, detail.as_deref()))]
    ProbeFailure {
        /// Name of the tool that failed.
        tool: String,
        /// Exit code, `None` when the process was terminated by a signal.
        status: Option<i32>,
        /// Everything the process wrote to stderr, verbatim.
        stderr: String,
        /// Message from the error section on stdout, if the tool wrote one.
        detail: Option<String>,
    },

    /// The probe process succeeded but its output could not be interpreted.
    #[error("failed to parse {format} output: {message}")]
    Parse {
        /// Output format the parser expected.
        format: OutputFormat,
        /// Human-readable parse failure.
        message: String,
        /// The offending output, kept for diagnosis.
        raw: String,
    },

    /// The probe was cancelled and its process terminated.
    #[error("{tool} was cancelled")]
    Cancelled {
        /// Name of the tool whose run was cancelled.
        tool: String,
    },

    /// The probe process exceeded its deadline and was terminated.
    #[error("{tool} timed out after {timeout:?}")]
    Timeout {
        /// Name of the tool that timed out.
        tool: String,
        /// The deadline that expired.
        timeout: Duration,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fieldless classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Spawn,
    ProbeFailure,
    Parse,
    Cancelled,
    Timeout,
    Io,
    Validation,
    Internal,
}

fn display_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn failure_text<'a>(stderr: &'a str, detail: Option<&'a str>) -> &'a str {
    let stderr = stderr.trim();
    match detail {
        Some(detail) if stderr.is_empty() => detail,
        _ => stderr,
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Spawn { .. } => ErrorKind::Spawn,
            Error::ProbeFailure { .. } => ErrorKind::ProbeFailure,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Io { .. } => ErrorKind::Io,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure is attributed to the probed input rather than the
    /// environment or the tool output.
    pub fn is_input_fault(&self) -> bool {
        matches!(self, Error::ProbeFailure { .. })
    }

    /// Convenience constructor for [`Error::Spawn`].
    pub fn spawn(tool: impl Into<String>, source: std::io::Error) -> Self {
        Error::Spawn {
            tool: tool.into(),
            source,
        }
    }

    /// Convenience constructor for [`Error::ProbeFailure`].
    pub fn probe_failure(
        tool: impl Into<String>,
        status: Option<i32>,
        stderr: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Error::ProbeFailure {
            tool: tool.into(),
            status,
            stderr: stderr.into(),
            detail,
        }
    }

    /// Convenience constructor for [`Error::Parse`].
    pub fn parse(format: OutputFormat, message: impl Into<String>, raw: impl Into<String>) -> Self {
        Error::Parse {
            format,
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Convenience constructor for [`Error::Cancelled`].
    pub fn cancelled(tool: impl Into<String>) -> Self {
        Error::Cancelled { tool: tool.into() }
    }

    /// Convenience constructor for [`Error::Timeout`].
    pub fn timeout(tool: impl Into<String>, timeout: Duration) -> Self {
        Error::Timeout {
            tool: tool.into(),
            timeout,
        }
    }

    /// Raw tool output attached to the error, if any.
    ///
    /// For [`Error::ProbeFailure`] this is the captured stderr, for
    /// [`Error::Parse`] the stdout text the parser rejected.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Error::ProbeFailure { stderr, .. } => Some(stderr),
            Error::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
