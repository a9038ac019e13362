//! Probe configuration types.
//!
//! [`ProbeConfig`] is injected once into a probe client and never mutated
//! afterwards. Every field defaults sensibly so an empty `[probe]` table (or
//! no config file at all) is valid.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::Error;

/// Default process deadline: 5 minutes.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Output format requested from the probe tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `-print_format json`; parsed by direct deserialization.
    #[default]
    Json,
    /// `-print_format default`; the `[STREAM]...[/STREAM]` block grammar.
    Flat,
}

impl OutputFormat {
    /// Value passed to the tool's `-print_format` flag.
    pub fn writer_name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Flat => "default",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "flat" | "default" | "text" => Ok(OutputFormat::Flat),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

/// How callers drive the probe process.
///
/// Both modes share the same subprocess primitive and produce identical
/// results; they differ only in scheduling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Async,
    Blocking,
}

/// Configuration for probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Explicit probe executable. `None` resolves `ffprobe` on the search path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
    /// Output format requested from the tool.
    pub output_format: OutputFormat,
    /// Call style used by batch drivers.
    pub mode: ExecutionMode,
    /// Upper bound on concurrently running probe processes.
    pub max_concurrent: usize,
    /// Per-process deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: None,
            output_format: OutputFormat::default(),
            mode: ExecutionMode::default(),
            max_concurrent: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProbeConfig {
    /// Per-process deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values that would make probing impossible.
    ///
    /// Returns non-fatal warnings on success.
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.max_concurrent == 0 {
            return Err(Error::Validation(
                "probe.max_concurrent must be at least 1".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Validation(
                "probe.timeout_secs must be at least 1".into(),
            ));
        }

        let mut warnings = Vec::new();
        if let Some(path) = &self.ffprobe_path {
            if !path.exists() {
                warnings.push(format!(
                    "probe.ffprobe_path {} does not exist",
                    path.display()
                ));
            }
        }
        Ok(warnings)
    }
}
