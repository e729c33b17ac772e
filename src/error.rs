//! Error types for pagecrop.

use std::io;
use thiserror::Error;

/// Result type alias for pagecrop operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while fetching, cropping and writing pages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The fetched bytes are not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Invalid crop rectangle.
    #[error("Invalid crop box: {0}")]
    InvalidCropBox(String),

    /// The HTTP request could not be completed.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Failed to fetch {url}: HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Error serializing a record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a failed request for `url`; status errors keep their status code.
    pub fn fetch(url: &str, source: reqwest::Error) -> Self {
        match source.status() {
            Some(status) => Error::HttpStatus {
                url: url.to_string(),
                status,
            },
            None => Error::Fetch {
                url: url.to_string(),
                source,
            },
        }
    }

    /// Whether a retry of the same request could succeed.
    ///
    /// Connection failures, timeouts and 5xx responses are transient;
    /// 4xx responses, malformed URLs and every non-network error are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch { source, .. } => {
                !source.is_builder()
                    && (source.is_timeout() || source.is_connect() || source.is_request())
            }
            Error::HttpStatus { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
