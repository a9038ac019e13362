use clap::{Args, Parser, Subcommand};
use mediaprobe_core::{ExecutionMode, OutputFormat, ProbeConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaprobe")]
#[command(author, version, about = "Probe media files with ffprobe")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe media files and print their streams, format and tags
    Probe(ProbeArgs),

    /// Check that ffprobe is available
    CheckTools {
        /// ffprobe executable to check
        #[arg(long, env = "FFPROBE_PATH")]
        ffprobe: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Files to probe
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format requested from ffprobe (json or flat)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// ffprobe executable to run
    #[arg(long, env = "FFPROBE_PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Use blocking probe calls instead of async ones
    #[arg(long)]
    pub blocking: bool,

    /// Maximum number of ffprobe processes to run at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-file timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print a short per-stream summary instead of JSON
    #[arg(long)]
    pub summary: bool,
}

impl ProbeArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut ProbeConfig) {
        if let Some(path) = &self.ffprobe {
            config.ffprobe_path = Some(path.clone());
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if self.blocking {
            config.mode = ExecutionMode::Blocking;
        }
        if let Some(jobs) = self.jobs {
            config.max_concurrent = jobs;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }
}
