//! # clipvault-av
//!
//! The external-tool layer of clipvault.
//!
//! This crate provides:
//!
//! - **Command recipes** ([`command`]) -- argument lists for the fixed
//!   ffprobe/ffmpeg invocations (probe, transcode, fade, concat).
//! - **Process execution** ([`ProcessRunner`]) -- runs one tool at a time,
//!   streams its output into the log and always reaps the child.
//! - **Duration probing** ([`Prober`]) -- reads the `duration=` line of
//!   `ffprobe -show_format`.
//! - **Transcoding** ([`Transcoder`]) -- the single-pass encode or the
//!   fade/intro composition with its intermediate [`Workspace`].
//! - **Tool location** ([`Tools`]) -- ffmpeg/ffprobe below a configured root.
//!
//! ## Example
//!
//! ```no_run
//! use clipvault_av::{ProcessRunner, Tools, Transcoder};
//! use std::path::Path;
//!
//! let tools = Tools::from_root("/opt/ffmpeg/bin");
//! let transcoder = Transcoder::new(tools, ProcessRunner::new());
//! transcoder.transcode(
//!     Path::new("/capture/ProjectA-clip1.avi"),
//!     Path::new("/archive/ProjectA/clip1.mp4"),
//! )?;
//! # Ok::<(), clipvault_av::Error>(())
//! ```

pub mod command;
mod error;
pub mod probe;
pub mod runner;
pub mod tools;
pub mod transcode;
pub mod workspace;

// Re-exports
pub use command::{FadeWindow, ToolCommand};
pub use error::{Error, Result};
pub use probe::{ClipDuration, Prober};
pub use runner::{ensure_success, ProcessRunner};
pub use tools::{ToolInfo, Tools};
pub use transcode::{FadeSettings, Transcoder};
pub use workspace::{move_file, Workspace};
