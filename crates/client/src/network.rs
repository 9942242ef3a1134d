//! The network seam.
//!
//! A resolved [`Network::fetch`] means the network answered, whatever the
//! status code. A rejected one is a network failure: offline, DNS, refused
//! connection, or a request aborted by its caller. All rejections are handled
//! the same way by the cache manager.

use thiserror::Error;
use zakatek_core::{Request, Response};

/// Ways a request can fail to produce any response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Host unreachable, DNS failure, refused connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The network stack gave up waiting.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The caller aborted the request.
    #[error("request aborted")]
    Aborted,

    /// Body exceeds the configured limit.
    #[error("response too large: {0}")]
    TooLarge(String),

    #[error("network error: {0}")]
    Other(String),
}

impl From<NetworkError> for zakatek_core::Error {
    fn from(err: NetworkError) -> Self {
        zakatek_core::Error::Network(err.to_string())
    }
}

/// Something that can turn a request into a response.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// A network that is never reachable.
///
/// Lets the host answer requests from the cache alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNetwork;

#[async_trait::async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        tracing::debug!(url = %request.url, "network disabled");
        Err(NetworkError::Connect("network disabled".to_string()))
    }
}
