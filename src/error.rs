/// Error types shared across the crate
///
/// Load failures are only ever seen by the image loader and its completion
/// handlers. Image sources collapse them into "placeholder or nothing".

use thiserror::Error;

/// Why an image load did not produce an image
#[derive(Debug, Error)]
pub enum LoadError {
    /// The request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// A local file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The body was not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A header value (usually the auth token) contains invalid characters
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// The URL scheme is not served by the transport
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// A `file://` URL that does not name a local path
    #[error("not a local file url: {0}")]
    InvalidFileUrl(String),

    /// Cancelled explicitly or superseded by a newer load on the same view
    #[error("load cancelled")]
    Cancelled,

    /// The background decode task panicked or was shut down
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl LoadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
