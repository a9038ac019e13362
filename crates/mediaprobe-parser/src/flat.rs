//! Parser for the flat `[SECTION] key=value [/SECTION]` output grammar.
//!
//! Sections are tracked on a stack so a nested section is attributed to its
//! parent. Top-level `STREAM`, `FORMAT`, `PROGRAM`, `CHAPTER` and `ERROR`
//! sections feed the document; a `STREAM` inside a `PROGRAM` is a program
//! stream; any other nested section (`SIDE_DATA`, ...) is folded into its
//! parent as an array under `<name>_list`.
//!
//! The grammar is loose across tool versions, so nothing here fails:
//! unparseable lines are skipped, stray end markers ignored, and sections
//! left open at end of input discarded.

use mediaprobe_core::{FieldMap, ParsedOutput};
use serde_json::Value;

use crate::lexer::{Lexer, Token};
use crate::normalize::{self, RawDocument, RawProgram};
use crate::value::type_value;

/// Key prefix the flat writer uses for disposition flags.
const DISPOSITION_PREFIX: &str = "DISPOSITION:";
const DISPOSITION_KEY: &str = "disposition";

/// Parse flat tool output.
pub fn parse_flat(input: &str) -> ParsedOutput {
    let mut parser = FlatParser::default();
    for token in Lexer::new(input) {
        match token {
            Token::Open(name) => parser.open(name),
            Token::Close(name) => parser.close(name),
            Token::Line(line) => parser.line(line),
        }
    }
    parser.finish()
}

#[derive(Debug)]
struct Frame {
    name: String,
    fields: FieldMap,
    /// Stream sections nested in a program.
    streams: Vec<FieldMap>,
}

impl Frame {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            fields: FieldMap::new(),
            streams: Vec::new(),
        }
    }

    fn insert(&mut self, key: &str, value: Value) {
        if let Some(flag) = key.strip_prefix(DISPOSITION_PREFIX) {
            let slot = self
                .fields
                .entry(DISPOSITION_KEY)
                .or_insert_with(|| Value::Object(FieldMap::new()));
            if !slot.is_object() {
                *slot = Value::Object(FieldMap::new());
            }
            if let Value::Object(flags) = slot {
                flags.insert(flag.to_string(), value);
            }
            return;
        }
        self.fields.insert(key.to_string(), value);
    }

    fn push_child(&mut self, child: Frame) {
        if self.name == "PROGRAM" && child.name == "STREAM" {
            self.streams.push(child.fields);
            return;
        }

        let key = format!("{}_list", child.name.to_ascii_lowercase());
        let item = Value::Object(child.fields);
        match self.fields.get_mut(&key) {
            Some(Value::Array(items)) => items.push(item),
            _ => {
                self.fields.insert(key, Value::Array(vec![item]));
            }
        }
    }
}

#[derive(Debug, Default)]
struct FlatParser {
    stack: Vec<Frame>,
    doc: RawDocument,
}

impl FlatParser {
    fn open(&mut self, name: &str) {
        // A section cannot contain itself: reopening closes the open one.
        if self.position(name).is_some() {
            tracing::trace!(section = name, "section reopened before its end marker");
            self.close(name);
        }
        self.stack.push(Frame::new(name));
    }

    fn close(&mut self, name: &str) {
        let Some(position) = self.position(name) else {
            tracing::trace!(section = name, "ignoring end marker without a start");
            return;
        };
        while self.stack.len() > position {
            if let Some(frame) = self.stack.pop() {
                self.complete(frame);
            }
        }
    }

    fn line(&mut self, line: &str) {
        let Some(frame) = self.stack.last_mut() else {
            tracing::trace!(line, "skipping line outside any section");
            return;
        };
        // Exactly one separator; anything else is ambiguous and dropped.
        if line.matches('=').count() != 1 {
            tracing::trace!(line, "skipping line without exactly one '='");
            return;
        }
        let Some((key, raw)) = line.split_once('=') else {
            return;
        };
        let key = key.trim();
        if key.is_empty() {
            tracing::trace!(line, "skipping line with empty key");
            return;
        }
        frame.insert(key, type_value(raw));
    }

    fn finish(mut self) -> ParsedOutput {
        if !self.stack.is_empty() {
            let open: Vec<&str> = self.stack.iter().map(|f| f.name.as_str()).collect();
            tracing::debug!(?open, "discarding sections without end marker");
            self.stack.clear();
        }
        normalize::build(self.doc)
    }

    /// Stack position of the innermost open section called `name`.
    fn position(&self, name: &str) -> Option<usize> {
        self.stack
            .iter()
            .rposition(|frame| frame.name.eq_ignore_ascii_case(name))
    }

    fn complete(&mut self, frame: Frame) {
        if let Some(parent) = self.stack.last_mut() {
            parent.push_child(frame);
            return;
        }

        match frame.name.as_str() {
            "STREAM" => self.doc.streams.push(frame.fields),
            "FORMAT" => match &mut self.doc.format {
                Some(format) => format.extend(frame.fields),
                None => self.doc.format = Some(frame.fields),
            },
            "PROGRAM" => self.doc.programs.push(RawProgram {
                fields: frame.fields,
                streams: frame.streams,
            }),
            "CHAPTER" => self.doc.chapters.push(frame.fields),
            "ERROR" => self.doc.error = Some(normalize::error_section(&frame.fields)),
            other => tracing::debug!(section = other, "ignoring unknown top-level section"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaprobe_core::{Fields, Metadata, Stream};
    use serde_json::json;

    const SAMPLE: &str = "\
[STREAM]
index=0
codec_name=mp3
codec_type=audio
sample_rate=44100
channels=2
bit_rate=320000
DISPOSITION:default=1
DISPOSITION:dub=0
TAG:encoder=LAME3.100
[/STREAM]
[FORMAT]
filename=/music/song.mp3
nb_streams=1
format_name=mp3
format_long_name=MP2/3 (MPEG audio layer 2/3)
duration=227.160000
bit_rate=320851
TAG:title=Song
TAG:artist=Someone
[/FORMAT]
";

    #[test]
    fn parses_sample() {
        let out = parse_flat(SAMPLE);

        let stream = out.streams.get(0).unwrap();
        assert_eq!(stream.codec_name(), Some("mp3"));
        assert_eq!(stream.get("sample_rate"), Some(&json!(44100)));
        assert_eq!(stream.get("disposition"), Some(&json!({"default": 1, "dub": 0})));
        assert!(!stream.contains("index"));
        assert_eq!(
            out.metadata.streams.get(0).and_then(|m| m.get_str("encoder")),
            Some("LAME3.100")
        );

        let format = out.format.unwrap();
        assert_eq!(format.get("duration"), Some(&json!(227.16)));
        assert_eq!(
            format.get_str("format_long_name"),
            Some("MP2/3 (MPEG audio layer 2/3)")
        );
        assert!(!format.contains("filename"));
        assert_eq!(out.metadata.format.title(), Some("Song"));
        assert!(format.fields.keys().all(|k| !k.contains("TAG")));
    }

    #[test]
    fn scrambled_indices_are_ordered() {
        let input = "\
[STREAM]\nindex=2\ncodec_name=c\n[/STREAM]
[STREAM]\nindex=0\ncodec_name=a\n[/STREAM]
[STREAM]\nindex=1\ncodec_name=b\n[/STREAM]
";
        let out = parse_flat(input);
        let names: Vec<_> = out.streams.iter().filter_map(Stream::codec_name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn index_zero_is_a_real_position() {
        let input = "[STREAM]\ncodec_name=x\n[/STREAM]\n[STREAM]\nindex=0\ncodec_name=y\n[/STREAM]\n";
        let out = parse_flat(input);
        // Position 0 is already taken by the unindexed stream; neither is lost.
        assert_eq!(out.streams.count(), 2);
        assert_eq!(out.streams.get(0).and_then(Stream::codec_name), Some("x"));
    }

    #[test]
    fn missing_format_markers() {
        let out = parse_flat("[STREAM]\nindex=0\ncodec_name=aac\n[/STREAM]\n");
        assert!(out.format.is_none());
        assert_eq!(out.streams.count(), 1);
    }

    #[test]
    fn empty_and_garbage_input() {
        let out = parse_flat("");
        assert!(out.streams.is_empty());
        assert!(out.format.is_none());

        let out = parse_flat("not a section\n=novalue\n[/STREAM]\n");
        assert!(out.streams.is_empty());
    }

    #[test]
    fn unterminated_section_is_discarded() {
        let out = parse_flat("[FORMAT]\nformat_name=mp3\n[/FORMAT]\n[STREAM]\nindex=0\n");
        assert!(out.streams.is_empty());
        assert!(out.format.is_some());
    }

    #[test]
    fn malformed_lines_skipped() {
        let input = "[FORMAT]\nformat_name=mp3\njunk line\n=orphan\nprobe_score=100\n[/FORMAT]\n";
        let format = parse_flat(input).format.unwrap();
        assert_eq!(format.fields.len(), 2);
        assert_eq!(format.get_u64("probe_score"), Some(100));
    }

    #[test]
    fn line_with_several_separators_is_skipped() {
        let input = "[FORMAT]\nTAG:comment=a=b\nk=v=w\nformat_name=mp3\n[/FORMAT]\n";
        let out = parse_flat(input);
        let format = out.format.unwrap();
        assert!(out.metadata.format.is_empty());
        assert!(!format.contains("k"));
        assert_eq!(format.format_name(), Some("mp3"));
    }

    #[test]
    fn tag_only_format_yields_empty_structure() {
        let out = parse_flat("[FORMAT]\nTAG:title=Song\n[/FORMAT]\n");
        let format = out.format.unwrap();
        assert!(format.fields.is_empty());
        assert_eq!(out.metadata.format.title(), Some("Song"));
    }

    #[test]
    fn side_data_folds_into_list() {
        let input = "\
[STREAM]
index=0
codec_type=video
[SIDE_DATA]
side_data_type=Display Matrix
rotation=-90
[/SIDE_DATA]
[SIDE_DATA]
side_data_type=Stereo 3D
[/SIDE_DATA]
[/STREAM]
";
        let out = parse_flat(input);
        let stream = out.streams.get(0).unwrap();
        let list = stream.get("side_data_list").and_then(Value::as_array).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["side_data_type"], "Display Matrix");
        assert_eq!(list[0]["rotation"], "-90");
    }

    #[test]
    fn program_streams_stay_in_program() {
        let input = "\
[PROGRAM]
program_id=1
program_num=1
TAG:service_name=Service01
[STREAM]
index=0
codec_name=mpeg2video
[/STREAM]
[/PROGRAM]
[STREAM]
index=0
codec_name=mpeg2video
[/STREAM]
";
        let out = parse_flat(input);
        assert_eq!(out.streams.count(), 1);
        assert_eq!(out.programs.len(), 1);
        let program = &out.programs[0];
        assert_eq!(program.get_u64("program_id"), Some(1));
        assert_eq!(program.metadata.get_str("service_name"), Some("Service01"));
        assert_eq!(program.streams.len(), 1);
        assert_eq!(program.streams[0].get_str("codec_name"), Some("mpeg2video"));
    }

    #[test]
    fn chapters_and_error() {
        let input = "\
[CHAPTER]
id=0
start_time=0.000000
TAG:title=Intro
[/CHAPTER]
[ERROR]
code=-2
string=No such file or directory
[/ERROR]
";
        let out = parse_flat(input);
        assert_eq!(out.chapters.len(), 1);
        assert_eq!(out.chapters[0].metadata.title(), Some("Intro"));
        let error = out.error.unwrap();
        assert_eq!(error.code, Some(-2));
        assert_eq!(error.message.as_deref(), Some("No such file or directory"));
    }

    #[test]
    fn mismatched_end_marker_closes_inner_sections() {
        let input = "[STREAM]\nindex=0\n[SIDE_DATA]\nside_data_type=x\n[/STREAM]\n";
        let out = parse_flat(input);
        let stream = out.streams.get(0).unwrap();
        assert!(stream.contains("side_data_list"));
    }

    #[test]
    fn reopened_section_closes_previous() {
        let input = "[STREAM]\nindex=0\n[STREAM]\nindex=1\n[/STREAM]\n";
        let out = parse_flat(input);
        assert_eq!(out.streams.count(), 2);
    }

    #[test]
    fn repeated_format_sections_merge() {
        let input = "[FORMAT]\nformat_name=mp3\n[/FORMAT]\n[FORMAT]\nduration=1.5\n[/FORMAT]\n";
        let format = parse_flat(input).format.unwrap();
        assert_eq!(format.format_name(), Some("mp3"));
        assert_eq!(format.get_f64("duration"), Some(1.5));
    }

    #[test]
    fn crlf_line_endings() {
        let input = "[STREAM]\r\nindex=0\r\ncodec_name=aac\r\nTAG:language=eng\r\n[/STREAM]\r\n";
        let out = parse_flat(input);
        assert_eq!(out.streams.get(0).and_then(Stream::codec_name), Some("aac"));
        assert_eq!(
            out.metadata.streams.get(0).and_then(Metadata::language),
            Some("eng")
        );
    }
}
