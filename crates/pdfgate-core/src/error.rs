use pdfgate_pdf::{InvalidPath, LoadError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The caller passed a path that is missing, empty, or does not exist.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidPath),
    /// The file exists but could not be loaded as an inspectable PDF.
    /// Encryption never surfaces here.
    #[error(transparent)]
    Document(#[from] LoadError),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The visit budget ran out before any disallowed action was found, so the
    /// document can be neither flagged nor passed.
    #[error("action walk truncated after {visits} visits without a verdict")]
    Truncated { visits: usize },
}

impl ScanError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ScanError::InvalidArgument(_))
    }
}
