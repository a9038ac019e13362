//! Shared test harness for integration tests.
//!
//! Provides [`FakeFfprobe`], a shell script standing in for the real probe
//! tool. Each fake lives in its own temp dir and replays canned stdout,
//! stderr and exit codes so tests never depend on a system ffprobe.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use mediaprobe_core::{OutputFormat, ProbeConfig};
use tempfile::TempDir;

/// A two-stream Matroska file as reported by `-print_format json`.
pub const SAMPLE_JSON: &str = r#"{
    "programs": [],
    "streams": [
        {
            "index": 0,
            "codec_name": "h264",
            "codec_type": "video",
            "width": 1920,
            "height": 1080,
            "r_frame_rate": "24000/1001",
            "disposition": { "default": 1, "forced": 0 },
            "tags": { "language": "und" }
        },
        {
            "index": 1,
            "codec_name": "aac",
            "codec_type": "audio",
            "sample_rate": "48000",
            "channels": 2,
            "disposition": { "default": 1, "forced": 0 },
            "tags": { "language": "eng", "title": "Stereo" }
        }
    ],
    "chapters": [],
    "format": {
        "filename": "/media/movie.mkv",
        "nb_streams": 2,
        "format_name": "matroska,webm",
        "duration": "5400.000000",
        "tags": { "title": "Movie", "encoder": "libebml v1.4.2" }
    }
}
"#;

/// The same file as reported by `-print_format default`.
pub const SAMPLE_FLAT: &str = "\
[STREAM]
index=0
codec_name=h264
codec_type=video
width=1920
height=1080
r_frame_rate=24000/1001
DISPOSITION:default=1
DISPOSITION:forced=0
TAG:language=und
[/STREAM]
[STREAM]
index=1
codec_name=aac
codec_type=audio
sample_rate=48000
channels=2
DISPOSITION:default=1
DISPOSITION:forced=0
TAG:language=eng
TAG:title=Stereo
[/STREAM]
[FORMAT]
filename=/media/movie.mkv
nb_streams=2
format_name=matroska,webm
duration=5400.000000
TAG:title=Movie
TAG:encoder=libebml v1.4.2
[/FORMAT]
";

/// A fake `ffprobe` executable backed by a shell script.
pub struct FakeFfprobe {
    dir: TempDir,
    path: PathBuf,
}

impl FakeFfprobe {
    /// Create a fake whose script body is `body` (run by `/bin/sh`).
    pub fn script(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("ffprobe");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("failed to chmod script");
        Self { dir, path }
    }

    /// A fake that prints `stdout` and exits 0.
    pub fn emitting(stdout: &str) -> Self {
        Self::responding(0, stdout, "")
    }

    /// A fake that prints `stdout`, writes `stderr` and exits with `code`.
    pub fn responding(code: i32, stdout: &str, stderr: &str) -> Self {
        let fake = Self::script("");
        fake.write_fixture("stdout.txt", stdout);
        fake.write_fixture("stderr.txt", stderr);
        fake.set_script(&format!(
            "cat '{out}'\ncat '{err}' >&2\nexit {code}",
            out = fake.fixture("stdout.txt").display(),
            err = fake.fixture("stderr.txt").display(),
        ));
        fake
    }

    /// A fake that sleeps for `secs` seconds before printing anything.
    pub fn sleeping(secs: u64) -> Self {
        Self::script(&format!("sleep {secs}\necho '{{}}'"))
    }

    /// A fake that prints each argument it receives on its own line.
    pub fn echoing_args() -> Self {
        Self::script("for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done")
    }

    /// Path to the executable script.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a fixture file inside the fake's temp dir.
    pub fn fixture(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a fixture file inside the fake's temp dir.
    pub fn write_fixture(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.fixture(name);
        fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    /// Probe configuration pointing at this fake.
    pub fn config(&self, format: OutputFormat) -> ProbeConfig {
        ProbeConfig {
            ffprobe_path: Some(self.path.clone()),
            output_format: format,
            ..Default::default()
        }
    }

    /// Replace the script body.
    pub fn set_script(&self, body: &str) {
        fs::write(&self.path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");
    }
}
