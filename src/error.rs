//! Error types for the gmat-lessons library.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while reading a lesson source.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid lesson TOML: {0}")]
    Toml(String),

    #[error("Invalid config TOML: {0}")]
    Config(String),

    #[error("Invalid heading level {0} (expected 1-6)")]
    HeadingLevel(u8),
}

/// Errors that occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Math rendering error in `{expression}`: {message}")]
    Math { expression: String, message: String },
}
