//! Operation-level errors for intake, collection, and export.
//!
//! Failures local to a single file or folder never surface here; they
//! are logged and counted by the operation that absorbed them.

use std::path::PathBuf;
use thiserror::Error;

use kyc_intake_core::FolderNameError;

pub type Result<T> = std::result::Result<T, KycError>;

#[derive(Error, Debug)]
pub enum KycError {
    #[error("KYC docs folder not found: {0}")]
    RootNotFound(PathBuf),

    #[error("no documents found in {0}")]
    RootEmpty(PathBuf),

    #[error("target client folder '{0}' not found")]
    FolderNotFound(String),

    #[error("invalid client folder name '{0}'")]
    InvalidFolderName(String),

    #[error("search directory is not valid: {0}")]
    InvalidSource(PathBuf),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("archive destination {0} is inside the folder being archived")]
    InvalidDestination(PathBuf),

    #[error(transparent)]
    MalformedFolderName(#[from] FolderNameError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid exclude glob: {0}")]
    Glob(#[from] globset::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl KycError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KycError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller supplied bad input, as opposed to the
    /// operation failing or its target being missing.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            KycError::InvalidFolderName(_)
                | KycError::InvalidSource(_)
                | KycError::InvalidUpload(_)
                | KycError::InvalidDestination(_)
                | KycError::MalformedFolderName(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KycError::RootNotFound(_) | KycError::RootEmpty(_) | KycError::FolderNotFound(_)
        )
    }
}
