mod settings;
mod types;

pub use settings::{profile_prefix, resolve, Settings};
pub use types::*;

use std::path::{Path, PathBuf};

/// Configuration keys.
pub mod keys {
    pub const FFMPEG_ROOT: &str = "ffmpeg_root";
    pub const INPUT_DIRECTORY: &str = "input_directory";
    pub const OUTPUT_DIRECTORY: &str = "output_directory";
    pub const PROJECT_DELIMITER: &str = "project_delimiter";
    pub const OUTPUT_FILE_SUFFIX: &str = "output_file_suffix";
    pub const ORIGINAL_FILE_SUFFIX: &str = "original_file_suffix";
    pub const DRY_RUN: &str = "dry_run";
    pub const COPY_ONLY: &str = "copy_only";
    pub const DELETE_INPUT_FILE: &str = "delete_input_file";
    pub const FADING: &str = "fading";
    pub const FADING_DURATION: &str = "fading_duration";
    pub const INTRO: &str = "intro";
    pub const INTRO_FILE: &str = "intro_file";
    pub const UPLOAD: &str = "upload";
    pub const UPLOAD_COMMAND: &str = "upload_command";
    pub const PROCESS_TIMEOUT: &str = "process_timeout";
}

/// Configuration errors. All of them abort a run before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Key [{key}] is not configured")]
    Missing { key: String },

    #[error("Key [{key}] has invalid value [{value}]: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No config file found (tried {tried})")]
    NotFound { tried: String },
}

const DEFAULT_PATHS: [&str; 3] = [
    "./clipvault.toml",
    "~/.config/clipvault/config.toml",
    "/etc/clipvault/config.toml",
];

/// Load settings from `custom_path`, or from the first default location
/// that exists.
pub fn load_settings(
    custom_path: Option<&Path>,
    profile: Option<&str>,
) -> Result<Settings, ConfigError> {
    if let Some(path) = custom_path {
        return Settings::load(path, profile);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return Settings::load(path, profile);
        }
    }

    Err(ConfigError::NotFound {
        tried: DEFAULT_PATHS.join(", "),
    })
}
