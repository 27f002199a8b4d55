//! Version manifest error types
//!
//! These never cross the resolver boundary: a manifest that fails to parse
//! resolves to the default "no update available" entry. The strict parser
//! still reports what went wrong so tests can pin the failure modes.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ManifestError {
    #[error("manifest body is empty")]
    Empty,

    #[error("malformed manifest line: expected 3 fields, found {found}")]
    FieldCount { found: usize },

    #[error("manifest hash is not a valid digest: {value}")]
    InvalidHash { value: String },
}
