use std::path::PathBuf;
use std::time::Duration;

use clipvault_av::{FadeSettings, Tools};

use super::{keys, ConfigError, Settings};

/// Everything a conversion run needs, resolved once from [`Settings`].
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub tools: Tools,
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub project_delimiter: String,
    pub output_file_suffix: Option<String>,
    pub original_file_suffix: Option<String>,
    pub dry_run: bool,
    pub copy_only: bool,
    pub delete_input_file: bool,
    pub fading: Option<FadeSettings>,
    pub upload: Option<UploadConfig>,
    pub process_timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub command: PathBuf,
}

impl ConverterConfig {
    /// Resolve all keys. Keys only needed by an enabled feature are required
    /// only when that feature is on.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let fading = if settings.flag(keys::FADING) {
            let duration = parse_number::<u32>(settings, keys::FADING_DURATION)?;
            let intro = if settings.flag(keys::INTRO) {
                Some(PathBuf::from(settings.required(keys::INTRO_FILE)?))
            } else {
                None
            };
            Some(FadeSettings { duration, intro })
        } else {
            None
        };

        let upload = if settings.flag(keys::UPLOAD) {
            Some(UploadConfig {
                command: PathBuf::from(settings.required(keys::UPLOAD_COMMAND)?),
            })
        } else {
            None
        };

        let process_timeout = match settings.optional(keys::PROCESS_TIMEOUT) {
            Some(_) => Some(Duration::from_secs(parse_number::<u64>(
                settings,
                keys::PROCESS_TIMEOUT,
            )?)),
            None => None,
        };

        Ok(Self {
            tools: Tools::from_root(settings.required(keys::FFMPEG_ROOT)?),
            input_directory: PathBuf::from(settings.required(keys::INPUT_DIRECTORY)?),
            output_directory: PathBuf::from(settings.required(keys::OUTPUT_DIRECTORY)?),
            project_delimiter: settings.required(keys::PROJECT_DELIMITER)?.to_string(),
            output_file_suffix: settings.optional(keys::OUTPUT_FILE_SUFFIX).map(String::from),
            original_file_suffix: settings
                .optional(keys::ORIGINAL_FILE_SUFFIX)
                .map(String::from),
            dry_run: settings.flag(keys::DRY_RUN),
            copy_only: settings.flag(keys::COPY_ONLY),
            delete_input_file: settings.flag(keys::DELETE_INPUT_FILE),
            fading,
            upload,
            process_timeout,
        })
    }
}

fn parse_number<T>(settings: &Settings, key: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = settings.required(key)?;
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
