//! In-memory bucket store.
//!
//! Same contract as [`CacheDb`](super::CacheDb) without touching disk. Used by
//! tests and by `--in-memory` runs of the host binary.

use tokio::sync::RwLock;

use super::hash::request_key;
use super::{CacheEntry, CacheStorage, EntrySummary};
use crate::{Error, Request, Response};

#[derive(Debug, Clone)]
struct StoredEntry {
    key_hash: String,
    method: String,
    url: String,
    response: Response,
    stored_at: String,
}

#[derive(Debug, Clone)]
struct Bucket {
    name: String,
    entries: Vec<StoredEntry>,
}

/// Bucket store held behind a `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    buckets: RwLock<Vec<Bucket>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|b| b.name == bucket) {
            buckets.push(Bucket { name: bucket.to_string(), entries: Vec::new() });
        }
        Ok(())
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.buckets.read().await.iter().any(|b| b.name == bucket))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.buckets.read().await.iter().map(|b| b.name.clone()).collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|b| b.name != bucket);
        Ok(buckets.len() != before)
    }

    async fn match_entry(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key_hash = request_key(request);
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|b| b.name == bucket)
            .and_then(|b| b.entries.iter().find(|e| e.key_hash == key_hash))
            .map(|e| e.response.clone()))
    }

    async fn put_all(&self, bucket: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        let stored_at = chrono::Utc::now().to_rfc3339();
        let mut buckets = self.buckets.write().await;

        let index = match buckets.iter().position(|b| b.name == bucket) {
            Some(i) => i,
            None => {
                buckets.push(Bucket { name: bucket.to_string(), entries: Vec::new() });
                buckets.len() - 1
            }
        };
        let target = &mut buckets[index];

        for entry in entries {
            let stored = StoredEntry {
                key_hash: request_key(&entry.request),
                method: entry.request.method,
                url: entry.request.url.to_string(),
                response: entry.response,
                stored_at: stored_at.clone(),
            };

            match target.entries.iter_mut().find(|e| e.key_hash == stored.key_hash) {
                Some(existing) => *existing = stored,
                None => target.entries.push(stored),
            }
        }

        Ok(())
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<EntrySummary>, Error> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| {
                b.entries
                    .iter()
                    .map(|e| EntrySummary {
                        method: e.method.clone(),
                        url: e.url.clone(),
                        status: e.response.status,
                        size: e.response.body.len(),
                        stored_at: e.stored_at.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn entry(path: &str, body: &'static str) -> CacheEntry {
        let url = Url::parse(&format!("http://localhost:8080{path}")).unwrap();
        CacheEntry::new(Request::get(url.clone()), Response::new(url, 200, body))
    }

    #[tokio::test]
    async fn test_open_and_keys() {
        let store = MemoryStorage::new();
        store.open("v1").await.unwrap();
        store.open("v2").await.unwrap();
        store.open("v1").await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["v1".to_string(), "v2".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_bucket() {
        let store = MemoryStorage::new();
        assert!(!store.delete("never-created").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_after_put_all() {
        let store = MemoryStorage::new();
        let stored = entry("/index.html", "home");
        store.put_all("v1", vec![stored.clone()]).await.unwrap();

        assert_eq!(store.match_entry("v1", &stored.request).await.unwrap(), Some(stored.response.clone()));
        assert!(store.match_entry("v2", &stored.request).await.unwrap().is_none());

        let post = stored.request.with_method("POST");
        assert!(store.match_entry("v1", &post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_replaces_same_key() {
        let store = MemoryStorage::new();
        store.put_all("v1", vec![entry("/style.css", "a")]).await.unwrap();
        store.put_all("v1", vec![entry("/style.css", "bbb")]).await.unwrap();

        let listed = store.entries("v1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size, 3);
    }

    #[tokio::test]
    async fn test_entries_of_missing_bucket_is_empty() {
        let store = MemoryStorage::new();
        assert!(store.entries("nope").await.unwrap().is_empty());
    }
}
