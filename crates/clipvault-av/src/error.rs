//! Error types for clipvault-av.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the external tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {}", path.display())]
    ToolNotFound { path: PathBuf },

    /// The tool could not be started at all.
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{tool} exited with {status}")]
    ProcessFailed { tool: String, status: ExitStatus },

    /// The tool did not finish within the configured timeout and was killed.
    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: String, after: Duration },

    /// One stage of a file's conversion failed.
    #[error("transcoding {} failed during {stage}: {source}", input.display())]
    TranscodeFailed {
        input: PathBuf,
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// The prober output ended without a duration line.
    #[error("could not determine a duration for {}", path.display())]
    DurationNotFound { path: PathBuf },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Intermediate artifact handling failed.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ToolNotFound { path: path.into() }
    }

    /// Create a process failed error.
    pub fn process_failed(tool: impl Into<String>, status: ExitStatus) -> Self {
        Self::ProcessFailed {
            tool: tool.into(),
            status,
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Wrap an error as a failed conversion stage of `input`.
    pub fn transcode_failed(input: impl Into<PathBuf>, stage: &'static str, source: Error) -> Self {
        Self::TranscodeFailed {
            input: input.into(),
            stage,
            source: Box::new(source),
        }
    }
}
