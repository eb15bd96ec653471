//! Error types for fob-chunks operations.

use crate::cache::CacheError;

/// Error types for fob-chunks operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Plugin options failed validation.
    #[error("Invalid configuration: {field}: {message}")]
    InvalidConfig { field: String, message: String },

    /// Cache backend failure (fatal for the current build).
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Manifest serialization failed.
    #[error("Manifest serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Output file already exists and overwrite is disabled.
    #[error("Output exists: {0}")]
    OutputExists(String),
}

/// Result type alias for fob-chunks operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error on a named option.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
            Error::Cache(_) => "CACHE_ERROR",
            Error::Serialize(_) => "SERIALIZE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::OutputExists(_) => "OUTPUT_EXISTS",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidConfig { field, .. } => Some(Box::new(format!(
                "Check the '{}' option passed to the chunks plugin.",
                field
            ))),
            Error::Cache(_) => Some(Box::new(
                "The chunks cache could not be read or written. Delete the cache directory to start from a cold cache.",
            )),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it's within the output directory and doesn't contain '..' components.",
                path
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            Error::OutputExists(msg) => Some(Box::new(format!(
                "Output file already exists: {}\nPass overwrite=true to replace existing files.",
                msg
            ))),
            _ => None,
        }
    }
}
