//! Parser for the tool's JSON output.
//!
//! The document is deserialised directly; the result is then normalised to
//! the same shape the flat parser produces. In particular `format.filename`
//! is stripped here as well.

use mediaprobe_core::{Error, FieldMap, OutputFormat, ParsedOutput, Result};
use serde::Deserialize;

use crate::normalize::{self, RawDocument, RawProgram};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonDocument {
    streams: Vec<FieldMap>,
    format: Option<FieldMap>,
    programs: Vec<JsonProgram>,
    chapters: Vec<FieldMap>,
    error: Option<FieldMap>,
}

#[derive(Debug, Deserialize)]
struct JsonProgram {
    #[serde(flatten)]
    fields: FieldMap,
    #[serde(default)]
    streams: Vec<FieldMap>,
}

impl From<JsonDocument> for RawDocument {
    fn from(doc: JsonDocument) -> Self {
        RawDocument {
            streams: doc.streams,
            format: doc.format,
            programs: doc
                .programs
                .into_iter()
                .map(|p| RawProgram {
                    fields: p.fields,
                    streams: p.streams,
                })
                .collect(),
            chapters: doc.chapters,
            error: doc.error.as_ref().map(normalize::error_section),
        }
    }
}

/// Parse JSON tool output.
///
/// Malformed or truncated input is a [`Error::Parse`] carrying the raw text.
pub fn parse_json(input: &str) -> Result<ParsedOutput> {
    let doc: JsonDocument = serde_json::from_str(input)
        .map_err(|e| Error::parse(OutputFormat::Json, e.to_string(), input))?;
    Ok(normalize::build(doc.into()))
}
