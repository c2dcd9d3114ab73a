//! Hand-off of finished outputs to an upload collaborator.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clipvault_av::{ensure_success, ProcessRunner, ToolCommand};

/// Receives one finished output file per successful conversion.
pub trait Uploader {
    fn upload(&self, path: &Path) -> Result<()>;
}

/// Uploads by running an external command with the output path as its only
/// argument.
#[derive(Debug, Clone)]
pub struct CommandUploader {
    command: PathBuf,
    runner: ProcessRunner,
}

impl CommandUploader {
    pub fn new(command: impl Into<PathBuf>, runner: ProcessRunner) -> Self {
        Self {
            command: command.into(),
            runner,
        }
    }
}

impl Uploader for CommandUploader {
    fn upload(&self, path: &Path) -> Result<()> {
        let mut cmd = ToolCommand::new(&self.command);
        cmd.arg(path);

        tracing::info!("Uploading [{}]", path.display());
        let status = self
            .runner
            .run(&cmd, true, true)
            .with_context(|| format!("Failed to run upload command [{}]", cmd))?;
        ensure_success(&cmd, status)?;
        Ok(())
    }
}
