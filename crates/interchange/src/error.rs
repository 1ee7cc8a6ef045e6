use thiserror::Error;

use boqkit_core::DomainError;

pub type InterchangeResult<T> = Result<T, InterchangeError>;

#[derive(Debug, Error)]
pub enum InterchangeError {
    /// Input text is not a well-formed document of the expected format.
    #[error("invalid {format} file: {reason}")]
    Format { format: &'static str, reason: String },

    /// File extension is neither `.json` nor `.csv`.
    #[error("unsupported file type '{0}': please select a .json or .csv file")]
    UnsupportedFormat(String),

    /// Serializing the catalog failed.
    #[error("failed to encode {format}: {reason}")]
    Encode { format: &'static str, reason: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl InterchangeError {
    pub fn format(format: &'static str, reason: impl ToString) -> Self {
        Self::Format {
            format,
            reason: reason.to_string(),
        }
    }

    pub fn encode(format: &'static str, reason: impl ToString) -> Self {
        Self::Encode {
            format,
            reason: reason.to_string(),
        }
    }
}
