//! Shape normalisation shared by the flat and JSON parsers.
//!
//! Both parsers first collect raw field maps per section into a
//! [`RawDocument`]; [`build`] then applies the rules that give every probe
//! the same [`ParsedOutput`] shape regardless of the tool's output format:
//!
//! - `index` is removed from each stream and decides its position,
//! - `TAG:`-prefixed keys and `tags` objects become [`Metadata`],
//! - `filename` is removed from the format section.

use mediaprobe_core::{
    ErrorSection, FieldMap, Format, Metadata, ParsedOutput, ProbeMetadata, Program, Slots, Stream,
    TaggedSection,
};
use serde_json::Value;

/// Key prefix the flat writer uses for tags.
pub const TAG_PREFIX: &str = "TAG:";

/// Key under which the JSON writer nests tags.
pub const TAGS_KEY: &str = "tags";

/// Stream field that declares the stream's position.
pub const INDEX_KEY: &str = "index";

/// Format field duplicating the input path; always stripped.
pub const FILENAME_KEY: &str = "filename";

/// Largest declared index honoured for placement. Streams declaring more are
/// appended instead, so a corrupt index cannot allocate an enormous sequence.
pub const MAX_STREAM_INDEX: u64 = 65_535;

/// Section field maps collected by a parser, before normalisation.
#[derive(Debug, Default)]
pub struct RawDocument {
    pub streams: Vec<FieldMap>,
    pub format: Option<FieldMap>,
    pub programs: Vec<RawProgram>,
    pub chapters: Vec<FieldMap>,
    pub error: Option<ErrorSection>,
}

/// A program section and the stream sections nested in it.
#[derive(Debug, Default)]
pub struct RawProgram {
    pub fields: FieldMap,
    pub streams: Vec<FieldMap>,
}

/// Normalise a collected document.
pub fn build(doc: RawDocument) -> ParsedOutput {
    let (streams, stream_metadata) = place_streams(doc.streams);

    let (format, format_metadata) = match doc.format {
        Some(fields) => {
            let (mut fields, tags) = split_tags(fields);
            fields.remove(FILENAME_KEY);
            (Some(Format::new(fields)), tags)
        }
        None => (None, Metadata::default()),
    };

    let programs = doc
        .programs
        .into_iter()
        .map(|program| {
            let (fields, metadata) = split_tags(program.fields);
            Program {
                fields,
                metadata,
                streams: program.streams.into_iter().map(tagged_section).collect(),
            }
        })
        .collect();

    ParsedOutput {
        streams,
        format,
        metadata: ProbeMetadata {
            format: format_metadata,
            streams: stream_metadata,
        },
        programs,
        chapters: doc.chapters.into_iter().map(tagged_section).collect(),
        error: doc.error,
    }
}

/// Partition `fields` into structural fields and tags.
///
/// `TAG:title` becomes tag `title`. A `tags` object is merged into the tags
/// as-is; a non-object `tags` value stays structural.
pub fn split_tags(fields: FieldMap) -> (FieldMap, Metadata) {
    let mut structural = FieldMap::new();
    let mut tags = FieldMap::new();

    for (key, value) in fields {
        if key == TAGS_KEY {
            match value {
                Value::Object(nested) => tags.extend(nested),
                other => {
                    structural.insert(key, other);
                }
            }
            continue;
        }
        match key.strip_prefix(TAG_PREFIX) {
            Some(tag) => {
                tags.insert(tag.to_string(), value);
            }
            None => {
                structural.insert(key, value);
            }
        }
    }

    (structural, Metadata::new(tags))
}

/// Remove `index` from `fields`, returning it if it is a non-negative integer.
///
/// A non-integer `index` is still removed; the stream is then appended.
pub fn take_index(fields: &mut FieldMap) -> Option<u64> {
    let value = fields.remove(INDEX_KEY)?;
    match value.as_u64() {
        Some(index) => Some(index),
        None => {
            tracing::debug!(index = %value, "ignoring non-integer stream index");
            None
        }
    }
}

/// Read an error section from its field map.
///
/// The flat writer prints the (negative) code as plain text, which field
/// typing leaves as a string.
pub fn error_section(fields: &FieldMap) -> ErrorSection {
    let code = fields.get("code").and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let message = fields.get("string").map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    ErrorSection { code, message }
}

fn tagged_section(fields: FieldMap) -> TaggedSection {
    let (fields, metadata) = split_tags(fields);
    TaggedSection { fields, metadata }
}

/// Position streams by declared index, appending the rest in encounter order.
///
/// Streams are never dropped: a collision or an out-of-range index falls
/// back to appending.
fn place_streams(raw: Vec<FieldMap>) -> (Slots<Stream>, Slots<Metadata>) {
    let mut slots = Slots::new();

    for mut fields in raw {
        let index = take_index(&mut fields);
        let (fields, tags) = split_tags(fields);
        let entry = (Stream::new(fields), tags);

        match index {
            Some(index) if index <= MAX_STREAM_INDEX => {
                if let Err(entry) = slots.place(index as usize, entry) {
                    let position = slots.push(entry);
                    tracing::warn!(index, position, "duplicate stream index, appending");
                }
            }
            Some(index) => {
                let position = slots.push(entry);
                tracing::warn!(index, position, "stream index out of range, appending");
            }
            None => {
                slots.push(entry);
            }
        }
    }

    slots.unzip()
}
