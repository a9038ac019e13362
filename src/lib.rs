//! mediaprobe - structured media file probing on top of ffprobe
//!
//! This library crate exposes the CLI's configuration loading and batch
//! driver for integration testing. The probing itself lives in the
//! `mediaprobe-av`, `mediaprobe-parser` and `mediaprobe-core` crates.

pub mod batch;
pub mod config;
