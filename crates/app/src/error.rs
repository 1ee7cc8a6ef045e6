use std::path::PathBuf;

use thiserror::Error;

use boqkit_core::DomainError;
use boqkit_document::DocumentError;
use boqkit_interchange::InterchangeError;

/// Anything a command or import/export can fail with.
///
/// None of these leave state partially changed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Interchange(#[from] InterchangeError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// One-line message for the user.
    pub fn notice(&self) -> String {
        match self {
            AppError::Domain(err) | AppError::Interchange(InterchangeError::Domain(err)) => {
                match err {
                    DomainError::Validation(msg) => format!("Invalid input: {msg}"),
                    DomainError::InvalidId(msg) => format!("Invalid id: {msg}"),
                    DomainError::NotFound(what) => format!("Not found: {what}"),
                    DomainError::Conflict(msg) => format!("Conflict: {msg}"),
                    DomainError::InvariantViolation(msg) => format!("Rejected: {msg}"),
                }
            }
            AppError::Interchange(InterchangeError::UnsupportedFormat(name)) => {
                format!("Unsupported file type '{name}'. Please select a .json or .csv file.")
            }
            AppError::Interchange(InterchangeError::Format { format, reason }) => {
                format!("Invalid {format} file: {reason}")
            }
            AppError::Interchange(err @ InterchangeError::Encode { .. }) => {
                format!("Export failed: {err}")
            }
            AppError::Document(err) => format!("PDF export failed: {err}"),
            AppError::Io { path, source } => format!("Could not access {}: {source}", path.display()),
        }
    }
}
