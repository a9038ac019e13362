//! Probe result data model.
//!
//! The probe tool reports a container format, a list of streams, and
//! free-form tags on both. Structural fields stay in [`Stream`] / [`Format`];
//! tags are split out into [`Metadata`] maps that live under
//! [`ProbeResult::metadata`], with per-stream metadata at the same positions
//! as the streams they came from.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::slots::Slots;

/// Field name to typed value. Values are numbers or strings for flat output;
/// JSON output may also carry nested objects and arrays.
pub type FieldMap = serde_json::Map<String, Value>;

/// Read access shared by every field-map backed type.
pub trait Fields {
    /// The underlying map.
    fn fields(&self) -> &FieldMap;

    /// Raw value for `key`.
    fn get(&self, key: &str) -> Option<&Value> {
        self.fields().get(key)
    }

    /// String value for `key`; `None` if absent or not a string.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer value for `key`.
    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Numeric value for `key`, integers included.
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Whether `key` is present.
    fn contains(&self, key: &str) -> bool {
        self.fields().contains_key(key)
    }
}

/// Structural fields of one stream, without its index and tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stream {
    pub fields: FieldMap,
}

impl Stream {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// `codec_type` field (`video`, `audio`, `subtitle`, ...).
    pub fn codec_type(&self) -> Option<&str> {
        self.get_str("codec_type")
    }

    /// `codec_name` field.
    pub fn codec_name(&self) -> Option<&str> {
        self.get_str("codec_name")
    }
}

impl Fields for Stream {
    fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Structural container-format fields. Never contains `filename`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Format {
    pub fields: FieldMap,
}

impl Format {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// `format_name` field.
    pub fn format_name(&self) -> Option<&str> {
        self.get_str("format_name")
    }

    /// `duration` field in seconds.
    ///
    /// JSON output reports durations as decimal strings, flat output as
    /// numbers; both are accepted. Negative, non-finite and unrepresentably
    /// large values yield `None`.
    pub fn duration(&self) -> Option<Duration> {
        self.get("duration")
            .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()))
            .and_then(|secs: f64| Duration::try_from_secs_f64(secs).ok())
    }
}

impl Fields for Format {
    fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Tag key (without the `TAG:` prefix) to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    pub tags: FieldMap,
}

impl Metadata {
    pub fn new(tags: FieldMap) -> Self {
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// `title` tag.
    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// `language` tag.
    pub fn language(&self) -> Option<&str> {
        self.get_str("language")
    }
}

impl Fields for Metadata {
    fn fields(&self) -> &FieldMap {
        &self.tags
    }
}

/// A section with its own tags kept alongside, used for chapters and
/// program streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedSection {
    #[serde(flatten)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Fields for TaggedSection {
    fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// A chapter marker.
pub type Chapter = TaggedSection;

/// A program (e.g. an MPEG-TS service) with the streams it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(flatten)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<TaggedSection>,
}

impl Fields for Program {
    fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Error section the tool writes to stdout when asked to show errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSection {
    /// Negative AVERROR code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable message.
    #[serde(default, rename = "string")]
    pub message: Option<String>,
}

/// Tags split out of the format and stream sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeMetadata {
    /// Container-level tags.
    #[serde(default)]
    pub format: Metadata,
    /// One entry per stream, at the same position as in
    /// [`ProbeResult::streams`].
    #[serde(default)]
    pub streams: Slots<Metadata>,
}

/// Everything the parser extracts from one run of the tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    pub streams: Slots<Stream>,
    pub format: Option<Format>,
    pub metadata: ProbeMetadata,
    pub programs: Vec<Program>,
    pub chapters: Vec<Chapter>,
    pub error: Option<ErrorSection>,
}

/// Structured description of one probed media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Final path component, e.g. `song.mp3`.
    pub filename: String,
    /// Directory part of the input path; empty for a bare file name.
    pub filepath: String,
    /// Extension without the leading dot; empty when there is none.
    pub fileext: String,
    /// The input path exactly as given.
    pub file: String,
    /// Wall-clock time from process launch to output completion.
    #[serde(with = "duration_millis")]
    pub probe_time: Duration,
    /// Streams, positioned by their declared index.
    pub streams: Slots<Stream>,
    /// Container format; `None` when the tool reported no format section.
    pub format: Option<Format>,
    /// Format and per-stream tags.
    pub metadata: ProbeMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub programs: Vec<Program>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,
}

impl ProbeResult {
    /// Combine parser output with details derived from the input path.
    pub fn assemble(path: &Path, output: ParsedOutput, probe_time: Duration) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filepath = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fileext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            filename,
            filepath,
            fileext,
            file: path.to_string_lossy().into_owned(),
            probe_time,
            streams: output.streams,
            format: output.format,
            metadata: output.metadata,
            programs: output.programs,
            chapters: output.chapters,
        }
    }

    /// Stream at position `index`.
    pub fn stream(&self, index: usize) -> Option<&Stream> {
        self.streams.get(index)
    }

    /// Tags of the stream at position `index`.
    pub fn stream_metadata(&self, index: usize) -> Option<&Metadata> {
        self.metadata.streams.get(index)
    }

    /// Streams whose `codec_type` equals `codec_type`.
    pub fn streams_of_type<'a>(&'a self, codec_type: &'a str) -> impl Iterator<Item = &'a Stream> {
        self.streams
            .iter()
            .filter(move |s| s.codec_type() == Some(codec_type))
    }

    /// Container duration, if reported.
    pub fn duration(&self) -> Option<Duration> {
        self.format.as_ref().and_then(Format::duration)
    }
}

/// Serde helpers to (de)serialize `Duration` as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
