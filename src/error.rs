//! Error types for the incident map client.
//!
//! Every fallible operation returns [`Result`]. The UI never shows these
//! errors directly: each call site logs the detailed error and shows one of
//! the fixed messages in [`user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Network Errors ===
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Which endpoint was called.
        endpoint: &'static str,
        /// The HTTP status code.
        status: reqwest::StatusCode,
    },

    /// The request URL could not be built from the configured base URL.
    #[error("invalid URL {url}: {message}")]
    Url {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    // === Geocoding Errors ===
    /// The geocoding service rejected the query.
    #[error("geocoding failed with status {status}: {message}")]
    Geocode {
        /// Status string reported by the service.
        status: String,
        /// Optional error message from the service.
        message: String,
    },

    /// The geocoding service found nothing for the query.
    #[error("no results for '{query}'")]
    NoResults {
        /// The search text.
        query: String,
    },

    // === Location Errors ===
    /// The user (or configuration) denied location access.
    #[error("location permission denied")]
    PermissionDenied,

    // === Media Errors ===
    /// No capture command is configured.
    #[error("camera capture is not configured")]
    CaptureUnavailable,

    /// The capture command ran but did not produce a file.
    #[error("capture command failed: {message}")]
    Capture {
        /// Description of what went wrong.
        message: String,
    },

    /// Media preview could not be generated.
    #[error("failed to decode media {path}: {source}")]
    Image {
        /// The media file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A specialized Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// Fixed strings surfaced in the UI.
pub mod user_message {
    pub const PERMISSION_DENIED: &str = "Permission to access location was denied";
    pub const FETCH_FAILED: &str = "Failed to load events. Please try again.";
    pub const GEOCODE_FAILED: &str = "Failed to fetch location. Please try again.";
    pub const UPLOAD_FAILED: &str = "Failed to upload event. Please try again.";
    pub const UPLOAD_SUCCEEDED: &str = "Event uploaded successfully";
    pub const EMPTY_SEARCH: &str = "Please enter a location";
    pub const EMPTY_FIELDS: &str = "Please fill in all fields";
    pub const CAPTURE_UNAVAILABLE: &str = "Camera capture is not configured";
    pub const CAPTURE_FAILED: &str = "Failed to capture media. Please try again.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_names_endpoint() {
        let err = Error::Status {
            endpoint: "events",
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert_eq!(err.to_string(), "events returned status 502 Bad Gateway");
    }

    #[test]
    fn test_no_results_display() {
        let err = Error::NoResults {
            query: "atlantis".to_string(),
        };
        assert_eq!(err.to_string(), "no results for 'atlantis'");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
