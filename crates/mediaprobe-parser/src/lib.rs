//! # mediaprobe-parser
//!
//! Turns the text a media probe tool prints into a [`ParsedOutput`].
//!
//! Two output formats are understood:
//!
//! - **JSON**: deserialised directly. Malformed or truncated input is a
//!   [`Error::Parse`](mediaprobe_core::Error::Parse) carrying the raw text.
//! - **Flat**: the `[STREAM]` / `key=value` / `[/STREAM]` block grammar.
//!   Parsing never fails; unparseable lines are skipped and missing sections
//!   come back empty.
//!
//! Both are normalised to one shape: streams are positioned by their
//! `index`, tags are split into metadata, and the format section never
//! carries `filename`.
//!
//! ## Example
//!
//! ```
//! use mediaprobe_core::OutputFormat;
//! use mediaprobe_parser::parse_output;
//!
//! let raw = "[STREAM]\nindex=0\ncodec_name=aac\nTAG:language=eng\n[/STREAM]\n";
//! let parsed = parse_output(OutputFormat::Flat, raw).unwrap();
//!
//! assert_eq!(parsed.streams.get(0).and_then(|s| s.codec_name()), Some("aac"));
//! assert_eq!(parsed.metadata.streams.get(0).and_then(|m| m.language()), Some("eng"));
//! assert!(parsed.format.is_none());
//! ```

pub mod flat;
pub mod json;
pub mod lexer;
pub mod normalize;
pub mod value;

use mediaprobe_core::{ErrorSection, OutputFormat, ParsedOutput, Result};

pub use flat::parse_flat;
pub use json::parse_json;
pub use value::type_value;

/// Parse tool output in the given format.
pub fn parse_output(format: OutputFormat, input: &str) -> Result<ParsedOutput> {
    match format {
        OutputFormat::Json => parse_json(input),
        OutputFormat::Flat => Ok(parse_flat(input)),
    }
}

/// Best-effort extraction of the error section from failed-run output.
///
/// Returns `None` when the output is unparseable or has no error section.
pub fn extract_error(format: OutputFormat, input: &str) -> Option<ErrorSection> {
    if input.trim().is_empty() {
        return None;
    }
    parse_output(format, input).ok().and_then(|out| out.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaprobe_core::{Fields, Metadata};

    #[test]
    fn same_shape_from_both_formats() {
        let flat = "\
[STREAM]
index=0
codec_name=aac
TAG:language=eng
[/STREAM]
[FORMAT]
filename=x.mp3
format_name=mp3
TAG:title=Song
[/FORMAT]
";
        let json = r#"{
            "streams": [{"index": 0, "codec_name": "aac", "tags": {"language": "eng"}}],
            "format": {"filename": "x.mp3", "format_name": "mp3", "tags": {"title": "Song"}}
        }"#;

        let a = parse_output(OutputFormat::Flat, flat).unwrap();
        let b = parse_output(OutputFormat::Json, json).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.metadata.streams.get(0).and_then(Metadata::language), Some("eng"));
        assert!(!a.format.unwrap().contains("filename"));
    }

    #[test]
    fn extract_error_from_both_formats() {
        let flat = "[ERROR]\ncode=-2\nstring=No such file or directory\n[/ERROR]\n";
        let error = extract_error(OutputFormat::Flat, flat).unwrap();
        assert_eq!(error.message.as_deref(), Some("No such file or directory"));

        let json = r#"{"error": {"code": -2, "string": "No such file or directory"}}"#;
        assert_eq!(extract_error(OutputFormat::Json, json), Some(error));
    }

    #[test]
    fn extract_error_tolerates_junk() {
        assert_eq!(extract_error(OutputFormat::Json, ""), None);
        assert_eq!(extract_error(OutputFormat::Json, "{oops"), None);
        assert_eq!(extract_error(OutputFormat::Flat, "[STREAM]\n[/STREAM]\n"), None);
    }
}
