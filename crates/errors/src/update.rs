//! Update engine error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    #[error("update failed: {message}")]
    Failed { message: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("archive entry path is not installable: {path}")]
    InvalidEntryPath { path: String },

    #[error("atomic operation failed: {message}")]
    AtomicOperationFailed { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },
}
