use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clipvault_av::{move_file, ProcessRunner, Transcoder};
use walkdir::WalkDir;

use super::naming::{self, ParsedName};
use super::ConvertError;
use crate::config::{ConverterConfig, Settings};
use crate::upload::{CommandUploader, Uploader};

/// What happened to one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Converted,
    Archived,
    Skipped,
}

/// Batch driver: scans the input directory and converts every recording
/// whose name carries a project.
pub struct Converter {
    config: ConverterConfig,
    transcoder: Transcoder,
    uploader: Option<Box<dyn Uploader>>,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        let mut runner = ProcessRunner::new();
        if let Some(timeout) = config.process_timeout {
            runner = runner.with_timeout(timeout);
        }

        let mut transcoder = Transcoder::new(config.tools.clone(), runner.clone());
        if let Some(fading) = &config.fading {
            transcoder = transcoder.with_fading(fading.clone());
        }

        let uploader = config.upload.as_ref().map(|upload| {
            Box::new(CommandUploader::new(upload.command.clone(), runner.clone()))
                as Box<dyn Uploader>
        });

        Self {
            config,
            transcoder,
            uploader,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConvertError> {
        Ok(Self::new(ConverterConfig::from_settings(settings)?))
    }

    /// Replace the upload collaborator. It is only used when uploading is
    /// enabled in the configuration.
    pub fn with_uploader(mut self, uploader: Box<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Convert every matching file in the input directory.
    ///
    /// Only an unusable input directory aborts the run. Failures of single
    /// files are logged and leave that file's original in place.
    pub fn convert(&self) -> Result<(), ConvertError> {
        self.verify_input_directory()?;

        tracing::info!("Starting conversion process...");

        let (mut converted, mut archived, mut skipped, mut failed) = (0, 0, 0, 0);
        for file in self.input_files() {
            match self.process_file(&file) {
                Ok(FileOutcome::Converted) => converted += 1,
                Ok(FileOutcome::Archived) => archived += 1,
                Ok(FileOutcome::Skipped) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Failed to process [{}]: {:#}", file.display(), e);
                }
            }
        }

        tracing::info!(
            "Conversion finished: {} converted, {} archived, {} skipped, {} failed",
            converted,
            archived,
            skipped,
            failed
        );
        Ok(())
    }

    fn verify_input_directory(&self) -> Result<(), ConvertError> {
        let path = &self.config.input_directory;
        tracing::debug!("Verifying source directory...");

        if !path.exists() {
            return Err(ConvertError::InvalidConfiguration(format!(
                "Source directory [{}] does not exist!",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Err(ConvertError::InvalidConfiguration(format!(
                "Source directory [{}] exists but is no directory!",
                path.display()
            )));
        }

        tracing::info!("Source directory [{}] found.", path.display());
        Ok(())
    }

    /// Regular `*.avi` files directly inside the input directory.
    fn input_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.config.input_directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.into_path()),
                Err(e) => {
                    tracing::warn!("Cannot read input directory entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file() && naming::has_input_extension(path))
            .collect()
    }

    fn process_file(&self, file: &Path) -> Result<FileOutcome> {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!("Converting file [{}]", file_name);

        let Some(parsed) = naming::parse(&file_name, &self.config.project_delimiter) else {
            tracing::warn!(
                "Project name not found in [{}] using delimiter [{}]. Ignoring file.",
                file_name,
                self.config.project_delimiter
            );
            return Ok(FileOutcome::Skipped);
        };
        tracing::info!("Identified project name [{}].", parsed.project);

        let project_dir = match self.create_project_directory(&parsed.project) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(
                    "Could not create project directory for [{}]: {:#}. Ignoring file.",
                    parsed.project,
                    e
                );
                return Ok(FileOutcome::Skipped);
            }
        };

        let output = project_dir.join(naming::output_file_name(
            &parsed.raw_name,
            self.config.output_file_suffix.as_deref(),
        ));
        tracing::info!("Output file will be [{}]", output.display());

        if self.config.copy_only {
            self.archive_original(file, &project_dir, &parsed)?;
            return Ok(FileOutcome::Archived);
        }

        if self.config.dry_run {
            tracing::info!("Dry run. Skipping ffmpeg.");
        } else {
            self.transcoder.transcode(file, &output)?;
            self.upload(&output);
        }

        if self.config.delete_input_file {
            tracing::info!("Deleting source file [{}].", file.display());
            std::fs::remove_file(file)
                .with_context(|| format!("Failed to delete source file [{}]", file.display()))?;
        } else {
            self.archive_original(file, &project_dir, &parsed)?;
        }

        Ok(FileOutcome::Converted)
    }

    fn create_project_directory(&self, project: &str) -> Result<PathBuf> {
        let directory = self.config.output_directory.join(project);

        if directory.is_dir() {
            tracing::info!("Project directory [{}] exists.", directory.display());
        } else {
            tracing::info!(
                "Project directory [{}] does not exist. Creating it now.",
                directory.display()
            );
            std::fs::create_dir_all(&directory)
                .with_context(|| format!("Failed to create [{}]", directory.display()))?;
        }

        anyhow::ensure!(
            directory.is_dir(),
            "[{}] is not a directory",
            directory.display()
        );
        Ok(directory)
    }

    fn archive_original(&self, file: &Path, project_dir: &Path, parsed: &ParsedName) -> Result<()> {
        let suffix = self.config.original_file_suffix.as_deref();
        match suffix {
            Some(suffix) => tracing::debug!("Original file suffix is [{}].", suffix),
            None => tracing::debug!("Original file suffix not provided."),
        }

        let destination = project_dir.join(naming::archive_file_name(&parsed.raw_name, suffix));
        tracing::info!(
            "Moving original file [{}] to project directory [{}].",
            file.display(),
            destination.display()
        );
        move_file(file, &destination).with_context(|| {
            format!(
                "Failed to move [{}] to [{}]",
                file.display(),
                destination.display()
            )
        })
    }

    /// Upload failures are logged only; the conversion itself succeeded.
    fn upload(&self, output: &Path) {
        if self.config.upload.is_none() {
            return;
        }
        let Some(uploader) = &self.uploader else {
            return;
        };

        let path = output
            .canonicalize()
            .unwrap_or_else(|_| output.to_path_buf());
        if let Err(e) = uploader.upload(&path) {
            tracing::warn!("Upload of [{}] failed: {:#}", path.display(), e);
        }
    }
}
