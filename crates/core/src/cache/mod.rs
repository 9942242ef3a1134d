//! Generation-bucketed response cache.
//!
//! Storage is organised in named buckets, one per cache generation. A bucket
//! maps request descriptors to stored responses and is only ever dropped as a
//! whole. Two backends implement the [`CacheStorage`] contract:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, versioned migrations
//! - [`MemoryStorage`]: in-process fake with identical semantics

pub mod buckets;
pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;

use serde::{Deserialize, Serialize};

pub use crate::Error;
use crate::{Request, Response};

pub use connection::CacheDb;
pub use memory::MemoryStorage;

/// A request paired with the response to store for it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub request: Request,
    pub response: Response,
}

impl CacheEntry {
    pub fn new(request: Request, response: Response) -> Self {
        Self { request, response }
    }
}

/// Listing row for one stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: usize,
    pub stored_at: String,
}

/// Bucket-level storage shared by every manager instance.
///
/// Implementations must tolerate concurrent create-if-absent and delete from
/// several callers; callers add no locking of their own.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if it does not exist yet.
    ///
    /// Install never needs this: [`CacheStorage::put_all`] creates the bucket
    /// together with its entries. It exists for seeding and inspection, and a
    /// bucket created here stays empty, which the manager does not treat as
    /// an installed generation.
    async fn open(&self, bucket: &str) -> Result<(), Error>;

    async fn has(&self, bucket: &str) -> Result<bool, Error>;

    /// Bucket names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Drop a bucket and every entry in it. Returns `false` if it was absent.
    async fn delete(&self, bucket: &str) -> Result<bool, Error>;

    /// Exact match on method and URL. Only `GET` requests can match.
    async fn match_entry(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Store a batch in one step: either every entry lands or none does.
    /// Creates the bucket when missing and replaces entries with equal keys.
    async fn put_all(&self, bucket: &str, entries: Vec<CacheEntry>) -> Result<(), Error>;

    async fn entries(&self, bucket: &str) -> Result<Vec<EntrySummary>, Error>;
}
