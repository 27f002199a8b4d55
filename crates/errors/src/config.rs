//! Configuration error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("failed to parse config: {message}")]
    ParseError { message: String },

    #[error("invalid config value: {message}")]
    Invalid { message: String },
}
