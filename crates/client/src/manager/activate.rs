//! Activate: prune every generation except the current one.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use zakatek_core::{CacheStorage, Error};

use super::{OfflineCacheManager, Phase};

/// A stale bucket that could not be dropped. It stays on disk until a later
/// activation removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDeletion {
    pub bucket: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    pub generation: String,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

/// Delete every bucket whose name differs from `current`.
///
/// Deletions run concurrently and the call returns once all of them have
/// finished. A failed deletion is logged and reported but does not fail the
/// call; only failing to enumerate buckets does.
pub async fn prune_stale_generations(storage: &dyn CacheStorage, current: &str) -> Result<ActivationReport, Error> {
    let stale: Vec<String> = storage
        .keys()
        .await?
        .into_iter()
        .filter(|name| name != current)
        .collect();

    let results = join_all(stale.into_iter().map(|name| async move {
        let outcome = storage.delete(&name).await;
        (name, outcome)
    }))
    .await;

    let mut report = ActivationReport { generation: current.to_string(), ..Default::default() };
    for (bucket, outcome) in results {
        match outcome {
            Ok(true) => {
                tracing::info!(generation = %current, stale = %bucket, "deleted stale generation");
                report.deleted.push(bucket);
            }
            Ok(false) => {
                tracing::debug!(stale = %bucket, "stale generation already gone");
            }
            Err(err) => {
                tracing::warn!(stale = %bucket, error = %err, "failed to delete stale generation");
                report.failed.push(FailedDeletion { bucket, reason: err.to_string() });
            }
        }
    }

    Ok(report)
}

impl OfflineCacheManager {
    /// Make this generation the only one in storage.
    ///
    /// Requires a committed install. Running it again with nothing new
    /// installed is a no-op, also when the calls overlap: they run one after
    /// the other and the later one finds nothing left to prune.
    pub async fn on_activate(&self) -> Result<ActivationReport, Error> {
        let _lifecycle = self.lifecycle.lock().await;
        let previous = self.phase().await;
        if !matches!(previous, Phase::Installed | Phase::Activated) {
            return Err(Error::NotInstalled(format!("generation {} is {}", self.generation, previous)));
        }

        self.set_phase(Phase::Activating).await;

        match prune_stale_generations(self.storage.as_ref(), &self.generation).await {
            Ok(report) => {
                self.set_phase(Phase::Activated).await;
                tracing::info!(
                    generation = %self.generation,
                    deleted = report.deleted.len(),
                    failed = report.failed.len(),
                    "activated"
                );
                Ok(report)
            }
            Err(err) => {
                self.set_phase(previous).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::{FailingDeleteStorage, StaticNetwork, origin};
    use super::*;
    use crate::manifest::PrecacheManifest;
    use zakatek_core::{CacheDb, MemoryStorage};

    async fn sqlite() -> Arc<dyn CacheStorage> {
        Arc::new(CacheDb::open_in_memory().await.unwrap())
    }

    async fn installed(generation: &str, storage: Arc<dyn CacheStorage>) -> OfflineCacheManager {
        let network = Arc::new(StaticNetwork::new().serve("/index.html", "home"));
        let manager = OfflineCacheManager::new(generation, origin(), storage, network).unwrap();
        manager.on_install(&PrecacheManifest::new(["/index.html"])).await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_prune_keeps_only_current() {
        let storage = MemoryStorage::new();
        for name in ["v1", "v2", "v3"] {
            storage.open(name).await.unwrap();
        }

        let report = prune_stale_generations(&storage, "v3").await.unwrap();

        let mut deleted = report.deleted.clone();
        deleted.sort();
        assert_eq!(deleted, vec!["v1".to_string(), "v2".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(storage.keys().await.unwrap(), vec!["v3".to_string()]);
    }

    #[tokio::test]
    async fn test_prune_without_current_bucket() {
        let storage = MemoryStorage::new();
        storage.open("old").await.unwrap();

        let report = prune_stale_generations(&storage, "new").await.unwrap();
        assert_eq!(report.deleted, vec!["old".to_string()]);
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let manager = OfflineCacheManager::new(
            "v1",
            origin(),
            Arc::new(MemoryStorage::new()),
            Arc::new(StaticNetwork::new()),
        )
        .unwrap();

        assert!(matches!(manager.on_activate().await, Err(Error::NotInstalled(_))));
        assert_eq!(manager.phase().await, Phase::Parsed);
    }

    #[tokio::test]
    async fn test_activate_after_failed_install() {
        let network = Arc::new(StaticNetwork::new());
        network.go_offline();
        let manager = OfflineCacheManager::new("v1", origin(), Arc::new(MemoryStorage::new()), network).unwrap();

        assert!(manager.on_install(&PrecacheManifest::new(["/index.html"])).await.is_err());
        assert!(matches!(manager.on_activate().await, Err(Error::NotInstalled(_))));
        assert_eq!(manager.phase().await, Phase::Redundant);
    }

    async fn activate_twice_is_idempotent(storage: Arc<dyn CacheStorage>) {
        storage.open("wesoly-zakatek-v1.0").await.unwrap();
        let manager = installed("wesoly-zakatek-v1.1", storage.clone()).await;

        let first = manager.on_activate().await.unwrap();
        assert_eq!(first.deleted, vec!["wesoly-zakatek-v1.0".to_string()]);
        let after_first = storage.keys().await.unwrap();

        let second = manager.on_activate().await.unwrap();
        assert!(second.deleted.is_empty());
        assert!(second.failed.is_empty());
        assert_eq!(storage.keys().await.unwrap(), after_first);
        assert_eq!(storage.entries("wesoly-zakatek-v1.1").await.unwrap().len(), 1);
        assert_eq!(manager.phase().await, Phase::Activated);
    }

    #[tokio::test]
    async fn test_activate_twice_is_idempotent_memory() {
        activate_twice_is_idempotent(Arc::new(MemoryStorage::new())).await;
    }

    #[tokio::test]
    async fn test_activate_twice_is_idempotent_sqlite() {
        activate_twice_is_idempotent(sqlite().await).await;
    }

    /// Two overlapping activations both succeed and prune each bucket once.
    async fn overlapping_activations(storage: Arc<dyn CacheStorage>) {
        for i in 0..20 {
            storage.open(&format!("stale-{i}")).await.unwrap();
        }
        let manager = installed("v1", storage.clone()).await;

        let (a, b) = tokio::join!(manager.on_activate(), manager.on_activate());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.deleted.len() + b.deleted.len(), 20);
        assert!(a.failed.is_empty() && b.failed.is_empty());
        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
        assert_eq!(manager.phase().await, Phase::Activated);
    }

    #[tokio::test]
    async fn test_overlapping_activations_memory() {
        overlapping_activations(Arc::new(MemoryStorage::new())).await;
    }

    #[tokio::test]
    async fn test_overlapping_activations_sqlite() {
        overlapping_activations(sqlite().await).await;
    }

    #[tokio::test]
    async fn test_reinstall_during_activation_stays_activated() {
        let storage = sqlite().await;
        storage.open("v0").await.unwrap();
        let manager = installed("v1", storage.clone()).await;

        let manifest = PrecacheManifest::new(["/index.html"]);
        let (activated, reinstalled) = tokio::join!(manager.on_activate(), manager.on_install(&manifest));

        assert!(activated.is_ok());
        assert!(reinstalled.is_ok());
        assert_eq!(manager.phase().await, Phase::Activated);
        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_deletion_does_not_fail_activation() {
        let storage = Arc::new(FailingDeleteStorage { fail_on: "v0".into(), ..Default::default() });
        storage.open("v0").await.unwrap();
        storage.open("v0.5").await.unwrap();

        let manager = installed("v1", storage.clone()).await;

        let report = manager.on_activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v0.5".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].bucket, "v0");
        assert_eq!(manager.phase().await, Phase::Activated);
        assert_eq!(storage.keys().await.unwrap(), vec!["v0".to_string(), "v1".to_string()]);
    }
}
