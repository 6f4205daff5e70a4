//! Error types for the comparison pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while comparing two pages
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing command-line input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to launch the browser or open a tab
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    /// Navigation or screenshot capture failed
    #[error("Capture failed: {0}")]
    Capture(String),

    /// HTML retrieval failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Screenshot comparison received unusable input
    #[error("Diff failed: {0}")]
    Diff(String),

    /// Writing an output artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Capture(err.to_string())
    }
}
