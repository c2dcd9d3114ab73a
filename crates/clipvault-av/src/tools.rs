//! Location and availability of the external tools.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool ran successfully.
    pub available: bool,
    /// First line of the version output, if available.
    pub version: Option<String>,
    /// Path that was checked.
    pub path: PathBuf,
    /// Where the tool was found on `PATH`, if not usable at `path`.
    pub path_hint: Option<PathBuf>,
}

/// Paths of the ffmpeg and ffprobe executables below one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Tools {
    /// Tools living directly in `root`, with the platform executable suffix.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            ffmpeg: root.join(executable("ffmpeg")),
            ffprobe: root.join(executable("ffprobe")),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    /// Check both tools.
    pub fn check(&self) -> Vec<ToolInfo> {
        vec![
            check_tool_with_arg("ffmpeg", &self.ffmpeg, "-version"),
            check_tool_with_arg("ffprobe", &self.ffprobe, "-version"),
        ]
    }

    /// Fail if either executable does not exist.
    pub fn require(&self) -> Result<()> {
        for path in [&self.ffmpeg, &self.ffprobe] {
            if !path.is_file() {
                return Err(Error::tool_not_found(path));
            }
        }
        Ok(())
    }
}

fn executable(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

/// Run `path version_arg` and report whether it worked.
pub fn check_tool_with_arg(name: &str, path: &Path, version_arg: &str) -> ToolInfo {
    let result = Command::new(path).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: path.to_path_buf(),
                path_hint: None,
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: path.to_path_buf(),
            path_hint: which::which(name).ok(),
        },
    }
}
