//! Common error types for SuperMango

use thiserror::Error;

/// Common result type for SuperMango operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SuperMango services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An uploaded image could not be parsed as an RGB raster
    #[error("Image decode error: {0}")]
    Decode(String),

    /// Severity model failed to load or run
    #[error("Model error: {0}")]
    Model(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
