//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], a scratch directory holding an input folder, an
//! output folder and fake `ffmpeg`/`ffprobe` scripts. The fake ffmpeg logs
//! each invocation, writes its last argument as the output file and fails
//! when any argument contains `__fail__`. The fake ffprobe reports a 10 second
//! clip.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clipvault::config::{keys, Settings};
use clipvault::upload::Uploader;
use tempfile::TempDir;

pub struct TestHarness {
    pub temp: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let harness = Self { temp };

        std::fs::create_dir_all(harness.tools_dir()).unwrap();
        std::fs::create_dir_all(harness.input_dir()).unwrap();

        let ffmpeg = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = -version ]; then echo 'ffmpeg version 6.1-test'; exit 0; fi\n\
             echo \"$@\" >> \"{calls}\"\n\
             for arg; do case \"$arg\" in *__fail__*) echo 'simulated failure' >&2; exit 1;; esac; done\n\
             for last; do :; done\n\
             echo 'frame=   25 fps=25 time=00:00:01.00' >&2\n\
             printf 'encoded' > \"$last\"\n",
            calls = harness.calls_file().display(),
        );
        harness.write_script("ffmpeg", &ffmpeg);
        harness.write_script(
            "ffprobe",
            "#!/bin/sh\n[ \"$1\" = -version ] && echo 'ffprobe version 6.1-test' && exit 0\necho '[FORMAT]'\necho 'format_name=avi'\necho 'duration=10.000000'\necho '[/FORMAT]'\n",
        );

        harness
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root().join("tools")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output")
    }

    fn calls_file(&self) -> PathBuf {
        self.root().join("ffmpeg.calls")
    }

    pub fn write_script(&self, name: &str, body: &str) {
        let path = self.tools_dir().join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Required keys pointing at this harness, delimiter `-`.
    pub fn settings(&self) -> Settings {
        Settings::from_pairs([
            (keys::FFMPEG_ROOT, self.tools_dir().display().to_string()),
            (keys::INPUT_DIRECTORY, self.input_dir().display().to_string()),
            (keys::OUTPUT_DIRECTORY, self.output_dir().display().to_string()),
            (keys::PROJECT_DELIMITER, "-".to_string()),
        ])
    }

    /// Same settings rendered as a TOML config file, for CLI tests.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.root().join("clipvault.toml");
        let content = format!(
            "ffmpeg_root = \"{}\"\ninput_directory = \"{}\"\noutput_directory = \"{}\"\nproject_delimiter = \"-\"\n{}\n",
            self.tools_dir().display(),
            self.input_dir().display(),
            self.output_dir().display(),
            extra
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn add_input(&self, name: &str) -> PathBuf {
        let path = self.input_dir().join(name);
        std::fs::write(&path, b"raw recording").unwrap();
        path
    }

    /// All files below the output directory, relative and sorted.
    pub fn output_files(&self) -> Vec<String> {
        list_files(&self.output_dir())
    }

    /// All files in the input directory, sorted.
    pub fn input_files(&self) -> Vec<String> {
        list_files(&self.input_dir())
    }

    /// Argument lines of every fake ffmpeg invocation.
    pub fn ffmpeg_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.calls_file())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// Uploader that only remembers what it was given.
#[derive(Clone, Default)]
pub struct RecordingUploader {
    pub uploaded: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingUploader {
    pub fn uploaded(&self) -> Vec<PathBuf> {
        self.uploaded.lock().unwrap().clone()
    }
}

impl Uploader for RecordingUploader {
    fn upload(&self, path: &Path) -> anyhow::Result<()> {
        self.uploaded.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
