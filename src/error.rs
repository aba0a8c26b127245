//! Error types for the lyric corpus builder.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
///
/// "Not found" is never an error here: adapters and the resolver return
/// `Option::None` for that. These variants are genuine faults.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or HTTP failure while fetching a document.
    #[error("Network error fetching {url}: {message}")]
    Fetch { url: String, message: String },

    /// A document could not be read as the expected markup.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An upstream feed (the chart) could not be obtained at all.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }
}
