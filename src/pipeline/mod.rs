pub mod driver;
pub mod naming;

pub use driver::Converter;

use crate::config::ConfigError;

/// Errors that abort a whole conversion run.
///
/// Problems with individual files never show up here; they are logged and
/// the batch moves on.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
