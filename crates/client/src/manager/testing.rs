//! Fakes for exercising the manager without sockets or disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use url::Url;
use zakatek_core::{CacheEntry, CacheStorage, EntrySummary, Error, MemoryStorage, Request, Response};

use crate::network::{Network, NetworkError};

pub fn origin() -> Url {
    Url::parse("http://localhost:8080/").unwrap()
}

pub fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

/// Serves canned responses by URL; unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct StaticNetwork {
    routes: HashMap<String, Response>,
    offline: AtomicBool,
    aborting: AtomicBool,
    calls: AtomicUsize,
}

impl StaticNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, path: &str, body: &'static str) -> Self {
        self.serve_status(path, 200, body)
    }

    pub fn serve_status(mut self, path: &str, status: u16, body: &'static str) -> Self {
        let url = url(path);
        let response = Response::new(url.clone(), status, body).with_header("content-type", "text/plain");
        self.routes.insert(url.to_string(), response);
        self
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Every request gets aborted by its caller.
    pub fn abort_requests(&self) {
        self.aborting.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Connect("offline".to_string()));
        }
        if self.aborting.load(Ordering::SeqCst) {
            return Err(NetworkError::Aborted);
        }

        Ok(self
            .routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(request.url.clone(), 404, "not found")))
    }
}

/// Memory store whose deletes of one bucket always fail.
#[derive(Debug, Default)]
pub struct FailingDeleteStorage {
    pub inner: MemoryStorage,
    pub fail_on: String,
}

#[async_trait::async_trait]
impl CacheStorage for FailingDeleteStorage {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.inner.open(bucket).await
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        self.inner.has(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        if bucket == self.fail_on {
            return Err(Error::Storage(format!("cannot delete {bucket}")));
        }
        self.inner.delete(bucket).await
    }

    async fn match_entry(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.inner.match_entry(bucket, request).await
    }

    async fn put_all(&self, bucket: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        self.inner.put_all(bucket, entries).await
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<EntrySummary>, Error> {
        self.inner.entries(bucket).await
    }
}
