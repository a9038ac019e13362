//! # mediaprobe-av
//!
//! Runs the media probe executable and turns its output into a
//! [`ProbeResult`](mediaprobe_core::ProbeResult).
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`]): async builder with timeout and
//!   cancellation, plus blocking variants driving the same future.
//! - **Tool discovery** ([`resolve_ffprobe`], [`check_tool`]): locate the
//!   probe executable and report its version.
//! - **Probe client** ([`ProbeClient`]): single, blocking and bounded
//!   concurrent probing, with per-call [`ProbeOptions`].
//!
//! ## Example
//!
//! ```no_run
//! use mediaprobe_av::ProbeClient;
//! use mediaprobe_core::ProbeConfig;
//!
//! # async fn example() -> mediaprobe_core::Result<()> {
//! let client = ProbeClient::new(ProbeConfig::default());
//! let result = client.probe("/music/song.mp3").await?;
//! println!("{} streams", result.streams.count());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod command;
pub mod tools;

pub use client::{probe_args, ProbeClient, ProbeOptions};
pub use command::{ToolCommand, ToolOutput};
pub use tools::{check_tool, resolve_ffprobe, ToolInfo, FFPROBE};

pub use tokio_util::sync::CancellationToken;
