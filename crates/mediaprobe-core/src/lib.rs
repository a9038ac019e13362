//! mediaprobe-core: shared types for the mediaprobe crates.
//!
//! This crate is the foundational dependency for the parser and runner
//! crates, providing the unified error type, probe configuration, and the
//! [`ProbeResult`] data model that every calling convention returns.

pub mod config;
pub mod error;
pub mod slots;
pub mod types;

// Re-export the most commonly used items at the crate root.
pub use config::{ExecutionMode, OutputFormat, ProbeConfig};
pub use error::{Error, ErrorKind, Result};
pub use slots::Slots;
pub use types::*;
