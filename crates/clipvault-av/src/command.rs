//! Argument-list builder and the fixed ffmpeg/ffprobe recipes.
//!
//! Every recipe returns a [`ToolCommand`] holding one argument per element,
//! so paths containing spaces or shell metacharacters reach the tool as a
//! single argument without any quoting.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Video codec used for every encode.
pub const VIDEO_CODEC: &str = "libx264";
/// Encoder quality preset.
pub const VIDEO_PRESET: &str = "slow";
/// Audio codec used for every encode.
pub const AUDIO_CODEC: &str = "aac";
/// Audio bitrate used for every encode.
pub const AUDIO_BITRATE: &str = "192k";
/// Encoder thread count.
pub const THREADS: &str = "4";

/// An external tool invocation: program path plus ordered arguments.
///
/// # Example
///
/// ```
/// use clipvault_av::ToolCommand;
/// use std::path::PathBuf;
///
/// let mut cmd = ToolCommand::new(PathBuf::from("ffprobe"));
/// cmd.arg("-show_format").arg("-i").arg("/videos/My Clip.avi");
/// assert_eq!(cmd.get_args().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Short name of the program, used in log lines and errors.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Build a [`std::process::Command`] with program and arguments set.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ToolCommand {
    /// Renders the invocation for logs, quoting arguments that contain spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_quoted(f, &self.program.to_string_lossy())?;
        for arg in &self.args {
            f.write_str(" ")?;
            write_quoted(f, &arg.to_string_lossy())?;
        }
        Ok(())
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if s.is_empty() || s.contains(char::is_whitespace) {
        write!(f, "\"{}\"", s)
    } else {
        f.write_str(s)
    }
}

/// Timing of the fade-in/fade-out applied by [`fade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeWindow {
    /// Length of both fades in seconds.
    pub duration: u32,
    /// Start of the fade-out in seconds. Not clamped: may be zero or negative
    /// for clips no longer than the fade itself.
    pub fade_out_start: i64,
}

impl FadeWindow {
    /// Fade-out starts `duration` seconds before the rounded clip length.
    pub fn for_clip(clip_seconds: i64, duration: u32) -> Self {
        Self {
            duration,
            fade_out_start: clip_seconds - i64::from(duration),
        }
    }
}

/// `ffprobe -show_format -i <input>`
pub fn probe(ffprobe: &Path, input: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffprobe);
    cmd.arg("-show_format").arg("-i").arg(input);
    cmd
}

/// Single-pass encode: video plus both audio streams, fixed codec settings.
pub fn transcode(ffmpeg: &Path, input: &Path, output: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg);
    cmd.arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-map", "0:v:0", "-map", "0:a:0", "-map", "0:a:1"]);
    encoder_args(&mut cmd);
    cmd.arg(output);
    cmd
}

/// Re-encode with the two audio streams mixed down and faded in and out,
/// together with a matching video fade.
pub fn fade(ffmpeg: &Path, input: &Path, output: &Path, window: FadeWindow) -> ToolCommand {
    let d = window.duration;
    let out = window.fade_out_start;
    let filter = format!(
        "[0:a:0][0:a:1]amix=inputs=2[mix];\
         [mix]afade=t=in:st=0:d={d},afade=t=out:st={out}:d={d}[aout];\
         [0:v:0]fade=t=in:st=0:d={d},fade=t=out:st={out}:d={d}[vout]"
    );

    let mut cmd = ToolCommand::new(ffmpeg);
    cmd.arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-filter_complex")
        .arg(filter)
        .args(["-map", "[vout]", "-map", "[aout]"]);
    encoder_args(&mut cmd);
    cmd.arg(output);
    cmd
}

/// Join `intro` in front of `main`, video and audio, into `output`.
pub fn concat(ffmpeg: &Path, intro: &Path, main: &Path, output: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg);
    cmd.arg("-y")
        .arg("-i")
        .arg(intro)
        .arg("-i")
        .arg(main)
        .arg("-filter_complex")
        .arg("[0:v:0][0:a:0][1:v:0][1:a:0]concat=n=2:v=1:a=1[vout][aout]")
        .args(["-map", "[vout]", "-map", "[aout]"]);
    encoder_args(&mut cmd);
    cmd.arg(output);
    cmd
}

fn encoder_args(cmd: &mut ToolCommand) {
    cmd.args(["-c:v", VIDEO_CODEC, "-preset", VIDEO_PRESET])
        .args(["-c:a", AUDIO_CODEC, "-b:a", AUDIO_BITRATE])
        .args(["-threads", THREADS]);
}
