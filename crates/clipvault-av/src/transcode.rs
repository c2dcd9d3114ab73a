//! Per-file transcoding: a single encode, or probe → fade [→ intro concat].

use std::path::{Path, PathBuf};

use crate::command::{self, FadeWindow, ToolCommand};
use crate::probe::Prober;
use crate::runner::{ensure_success, ProcessRunner};
use crate::tools::Tools;
use crate::workspace::Workspace;
use crate::{Error, Result};

/// Settings of the fading branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FadeSettings {
    /// Fade-in and fade-out length in seconds.
    pub duration: u32,
    /// Clip joined in front of the faded main content.
    pub intro: Option<PathBuf>,
}

/// Turns one input recording into one output file.
#[derive(Debug, Clone)]
pub struct Transcoder {
    tools: Tools,
    runner: ProcessRunner,
    fading: Option<FadeSettings>,
}

impl Transcoder {
    pub fn new(tools: Tools, runner: ProcessRunner) -> Self {
        Self {
            tools,
            runner,
            fading: None,
        }
    }

    /// Enable the fading branch.
    pub fn with_fading(mut self, fading: FadeSettings) -> Self {
        self.fading = Some(fading);
        self
    }

    /// Produce `output` from `input`.
    ///
    /// Any failing stage is reported as [`Error::TranscodeFailed`]. Files
    /// written before the failure are left in place.
    pub fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        match &self.fading {
            None => {
                let cmd = command::transcode(self.tools.ffmpeg(), input, output);
                self.execute(&cmd)
                    .map_err(|e| Error::transcode_failed(input, "transcode", e))
            }
            Some(fading) => self.transcode_with_fading(input, output, fading),
        }
    }

    fn transcode_with_fading(
        &self,
        input: &Path,
        output: &Path,
        fading: &FadeSettings,
    ) -> Result<()> {
        let duration = Prober::new(self.tools.ffprobe(), self.runner.clone())
            .probe(input)
            .map_err(|e| Error::transcode_failed(input, "probe", e))?;

        let window = FadeWindow::for_clip(duration.whole_seconds(), fading.duration);
        tracing::info!(
            "Clip is {}, fading {}s in and out (fade-out at {}s)",
            duration,
            window.duration,
            window.fade_out_start
        );

        let workspace =
            Workspace::new(output).map_err(|e| Error::transcode_failed(input, "workspace", e))?;

        let cmd = command::fade(self.tools.ffmpeg(), input, workspace.intermediate(), window);
        self.execute(&cmd)
            .map_err(|e| Error::transcode_failed(input, "fade", e))?;

        match &fading.intro {
            Some(intro) => {
                let cmd = command::concat(
                    self.tools.ffmpeg(),
                    intro,
                    workspace.intermediate(),
                    workspace.output(),
                );
                self.execute(&cmd)
                    .map_err(|e| Error::transcode_failed(input, "intro", e))?;
                workspace
                    .discard()
                    .map_err(|e| Error::transcode_failed(input, "cleanup", e))
            }
            None => workspace
                .finalize()
                .map(|_| ())
                .map_err(|e| Error::transcode_failed(input, "finalize", e)),
        }
    }

    fn execute(&self, cmd: &ToolCommand) -> Result<()> {
        tracing::info!("Issuing command [{}]", cmd);
        let status = self.runner.run(cmd, true, true)?;
        ensure_success(cmd, status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Fake tools that log their arguments and write their last argument.
    fn fake_tools(root: &Path, ffmpeg_exit: i32) -> Tools {
        let ffmpeg = format!(
            "#!/bin/sh\necho \"$@\" >> \"{log}\"\nfor last; do :; done\necho 'frame=1' >&2\nprintf 'encoded' > \"$last\"\nexit {ffmpeg_exit}\n",
            log = root.join("ffmpeg.calls").display(),
        );
        let ffprobe = "#!/bin/sh\necho '[FORMAT]'\necho 'duration=10.000000'\necho '[/FORMAT]'\n";

        for (name, body) in [("ffmpeg", ffmpeg.as_str()), ("ffprobe", ffprobe)] {
            let path = root.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        Tools::from_root(root)
    }

    fn calls(root: &Path) -> Vec<String> {
        std::fs::read_to_string(root.join("ffmpeg.calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_simple_branch_runs_one_encode() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 0);
        let input = dir.path().join("ProjectA-clip1.avi");
        let output = dir.path().join("clip1.mp4");
        std::fs::write(&input, b"raw").unwrap();

        Transcoder::new(tools, ProcessRunner::new())
            .transcode(&input, &output)
            .unwrap();

        assert!(output.exists());
        let calls = calls(dir.path());
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("-map 0:a:1"));
    }

    #[test]
    fn test_fading_without_intro_renames_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 0);
        let input = dir.path().join("ProjectA-clip1.avi");
        let output = dir.path().join("clip1.mp4");
        std::fs::write(&input, b"raw").unwrap();

        Transcoder::new(tools, ProcessRunner::new())
            .with_fading(FadeSettings {
                duration: 2,
                intro: None,
            })
            .transcode(&input, &output)
            .unwrap();

        assert!(output.exists());
        assert!(!dir.path().join(".clip1.fading.mp4").exists());
        let calls = calls(dir.path());
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("afade=t=out:st=8:d=2"));
    }

    #[test]
    fn test_fading_with_intro_concats_and_discards_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 0);
        let input = dir.path().join("ProjectA-clip1.avi");
        let intro = dir.path().join("intro.mp4");
        let output = dir.path().join("clip1.mp4");
        std::fs::write(&input, b"raw").unwrap();
        std::fs::write(&intro, b"intro").unwrap();

        Transcoder::new(tools, ProcessRunner::new())
            .with_fading(FadeSettings {
                duration: 2,
                intro: Some(intro.clone()),
            })
            .transcode(&input, &output)
            .unwrap();

        assert!(output.exists());
        assert!(!dir.path().join(".clip1.fading.mp4").exists());
        let calls = calls(dir.path());
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("concat=n=2"));
        assert!(calls[1].contains(&intro.display().to_string()));
    }

    #[test]
    fn test_failed_encode_is_transcode_failed() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 1);
        let input = dir.path().join("ProjectA-clip1.avi");
        std::fs::write(&input, b"raw").unwrap();

        let err = Transcoder::new(tools, ProcessRunner::new())
            .transcode(&input, &dir.path().join("clip1.mp4"))
            .unwrap_err();

        match err {
            Error::TranscodeFailed { stage, source, .. } => {
                assert_eq!(stage, "transcode");
                assert!(matches!(*source, Error::ProcessFailed { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_fade_leaves_intermediate_for_inspection() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 1);
        let input = dir.path().join("ProjectA-clip1.avi");
        let output = dir.path().join("clip1.mp4");
        std::fs::write(&input, b"raw").unwrap();

        let err = Transcoder::new(tools, ProcessRunner::new())
            .with_fading(FadeSettings {
                duration: 2,
                intro: None,
            })
            .transcode(&input, &output)
            .unwrap_err();

        assert!(matches!(err, Error::TranscodeFailed { stage: "fade", .. }));
        assert!(dir.path().join(".clip1.fading.mp4").exists());
        assert!(!output.exists());
    }
}
