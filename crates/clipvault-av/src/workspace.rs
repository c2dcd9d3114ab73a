//! Intermediate artifact management for the fading pipeline.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Workspace for one file's conversion.
///
/// Holds the path of the intermediate artifact written by the fade stage. It
/// lives next to the final output so that finalizing is a same-volume rename.
///
/// # Example
///
/// ```no_run
/// use clipvault_av::Workspace;
///
/// let workspace = Workspace::new("/archive/ProjectA/clip1.mp4")?;
/// // The fade stage writes to workspace.intermediate(), then either:
/// workspace.finalize()?;
/// # Ok::<(), clipvault_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    output_path: PathBuf,
    intermediate_path: PathBuf,
}

impl Workspace {
    /// Create a workspace producing `output`.
    pub fn new<P: AsRef<Path>>(output: P) -> Result<Self> {
        let output = output.as_ref();

        let stem = output
            .file_stem()
            .ok_or_else(|| Error::InvalidInput(format!("invalid output path {:?}", output)))?;
        let extension = output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let name = format!(".{}.fading{}", stem.to_string_lossy(), extension);
        let intermediate_path = output.with_file_name(name);

        Ok(Self {
            output_path: output.to_path_buf(),
            intermediate_path,
        })
    }

    /// Final output file path.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Intermediate artifact path.
    pub fn intermediate(&self) -> &Path {
        &self.intermediate_path
    }

    /// Move the intermediate artifact to the final output path.
    pub fn finalize(self) -> Result<PathBuf> {
        if !self.intermediate_path.exists() {
            return Err(Error::Workspace(format!(
                "Intermediate file does not exist: {:?}",
                self.intermediate_path
            )));
        }

        move_file(&self.intermediate_path, &self.output_path).map_err(|e| {
            Error::Workspace(format!("Failed to move output to destination: {}", e))
        })?;

        Ok(self.output_path)
    }

    /// Delete the intermediate artifact once it has been consumed.
    pub fn discard(self) -> Result<()> {
        std::fs::remove_file(&self.intermediate_path).map_err(|e| {
            Error::Workspace(format!(
                "Failed to remove intermediate file {:?}: {}",
                self.intermediate_path, e
            ))
        })
    }
}

/// Move `from` to `to`, replacing `to` if it exists.
///
/// Tries a rename first and falls back to copy plus delete when the rename
/// is refused, e.g. across filesystems.
pub fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                "Rename {:?} -> {:?} failed ({}), copying instead",
                from,
                to,
                rename_err
            );
            std::fs::copy(from, to).map_err(|_| rename_err)?;
            std::fs::remove_file(from)
        }
    }
}
