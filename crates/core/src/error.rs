//! Unified error types for zakatek.
//!
//! Every failure is local to the request or lifecycle phase that produced it;
//! nothing here is recorded globally.

use tokio_rusqlite::rusqlite;

/// Unified error types for the offline cache manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty generation id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Locator could not be resolved to an http(s) URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Two manifest entries resolve to the same request.
    #[error("DUPLICATE_REQUEST: {0}")]
    DuplicateRequest(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored data could not be encoded or decoded.
    #[error("CACHE_ERROR: {0}")]
    Storage(String),

    /// The network rejected the request (offline, DNS, aborted, ...).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The network answered with a non-OK status where one was required.
    #[error("HTTP_ERROR: {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// A manifest entry could not be precached; nothing was committed.
    #[error("INSTALL_FAILED: {locator}: {reason}")]
    InstallFailed { locator: String, reason: String },

    /// Activation was requested for a generation that never installed.
    #[error("NOT_INSTALLED: {0}")]
    NotInstalled(String),

    /// Navigation failed and no offline page is cached.
    #[error("NAVIGATION_FAILED: {0}")]
    NavigationFailed(String),

    /// Subresource missed the cache and the network failed.
    #[error("RESOURCE_UNAVAILABLE: {0}")]
    ResourceUnavailable(String),
}

impl Error {
    /// Process exit code used by the `zakatek` host binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidInput(_) | Error::InvalidUrl(_) | Error::DuplicateRequest(_) => 2,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Storage(_) => 3,
            Error::Network(_) | Error::HttpStatus { .. } => 4,
            Error::InstallFailed { .. } => 5,
            Error::NotInstalled(_) => 6,
            Error::NavigationFailed(_) => 7,
            Error::ResourceUnavailable(_) => 8,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailed { locator: "/style.css".to_string(), reason: "offline".to_string() };
        assert!(err.to_string().contains("INSTALL_FAILED"));
        assert!(err.to_string().contains("/style.css"));
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus { url: "http://localhost/a".to_string(), status: 404 };
        assert_eq!(err.to_string(), "HTTP_ERROR: http://localhost/a returned status 404");
    }

    #[test]
    fn test_exit_codes_distinguish_fetch_failures() {
        assert_eq!(Error::NavigationFailed("x".into()).exit_code(), 7);
        assert_eq!(Error::ResourceUnavailable("x".into()).exit_code(), 8);
        assert_ne!(Error::InvalidInput("x".into()).exit_code(), 0);
    }
}
