//! The host runtime: wires storage, network and the manager together and
//! owns the install retry schedule.

use std::sync::Arc;
use std::time::Duration;

use zakatek_client::{FetchClient, FetchConfig, InstallReport, Network, OfflineCacheManager, OfflineNetwork, PrecacheManifest};
use zakatek_core::{AppConfig, CacheDb, CacheStorage, Error, MemoryStorage};

pub struct Host {
    pub config: AppConfig,
    pub manager: OfflineCacheManager,
}

impl Host {
    /// Open storage and network as configured and restore any committed
    /// generation from an earlier run.
    pub async fn build(config: AppConfig, in_memory: bool, offline: bool) -> Result<Self, Error> {
        let storage: Arc<dyn CacheStorage> = if in_memory {
            Arc::new(MemoryStorage::new())
        } else {
            Arc::new(CacheDb::open(&config.db_path).await?)
        };

        let network: Arc<dyn Network> = if offline {
            Arc::new(OfflineNetwork)
        } else {
            Arc::new(FetchClient::new(FetchConfig::from(&config))?)
        };

        Self::with_parts(config, storage, network).await
    }

    pub async fn with_parts(
        config: AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let manager = OfflineCacheManager::from_config(&config, storage, network)?;
        let phase = manager.restore().await?;
        tracing::debug!(generation = %manager.generation(), %phase, "host ready");
        Ok(Self { config, manager })
    }

    pub fn manifest(&self) -> PrecacheManifest {
        PrecacheManifest::from_config(&self.config)
    }

    /// Install with the configured retry schedule.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        install_with_retries(
            &self.manager,
            &self.manifest(),
            self.config.install_attempts,
            self.config.install_retry_delay(),
        )
        .await
    }
}

/// Re-run a failed install up to `attempts` times in total.
///
/// Only fetch failures are retried; a malformed manifest fails immediately.
pub async fn install_with_retries(
    manager: &OfflineCacheManager, manifest: &PrecacheManifest, attempts: u32, delay: Duration,
) -> Result<InstallReport, Error> {
    let mut attempt = 1;
    loop {
        match manager.on_install(manifest).await {
            Ok(report) => return Ok(report),
            Err(err @ Error::InstallFailed { .. }) if attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %err, "install attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
