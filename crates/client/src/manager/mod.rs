//! Offline cache manager.
//!
//! Implements a cache-first strategy over one named generation of precached
//! resources. The host drives three lifecycle events:
//!
//! - [`OfflineCacheManager::on_install`]: fetch the whole manifest and commit
//!   it as the generation's bucket, all or nothing
//! - [`OfflineCacheManager::on_activate`]: drop every other generation
//! - [`OfflineCacheManager::on_fetch`]: cache, then network, then the offline
//!   page for failed navigations
//!
//! Storage and network are injected, so several managers (one per
//! generation) can share a single store while generations overlap.

mod activate;
mod install;
mod intercept;

#[cfg(test)]
mod testing;

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use url::Url;
use zakatek_core::{AppConfig, CacheStorage, Error, Request};

use crate::fetch::{parse_origin, resolve};
use crate::network::Network;

pub use activate::{ActivationReport, FailedDeletion, prune_stale_generations};
pub use install::InstallReport;
pub use intercept::{Served, Source};

/// Offline page used when none is configured.
pub const DEFAULT_OFFLINE_PAGE: &str = "/index.html";

/// Where a generation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, nothing stored yet.
    Parsed,
    Installing,
    /// Every manifest entry is committed; waiting for activation.
    Installed,
    Activating,
    Activated,
    /// Install failed; this generation will never activate.
    Redundant,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Parsed => "parsed",
            Phase::Installing => "installing",
            Phase::Installed => "installed",
            Phase::Activating => "activating",
            Phase::Activated => "activated",
            Phase::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Cache-first request handler bound to one generation.
pub struct OfflineCacheManager {
    generation: String,
    origin: Url,
    offline_page: Request,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    phase: RwLock<Phase>,
    /// Held for the whole of `on_install` / `on_activate`; lifecycle events
    /// on one manager run one at a time.
    lifecycle: Mutex<()>,
}

impl OfflineCacheManager {
    /// Create a manager for `generation` with `/index.html` as offline page.
    pub fn new(
        generation: impl Into<String>, origin: Url, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let generation = generation.into();
        if generation.trim().is_empty() {
            return Err(Error::InvalidInput("generation id must not be empty".into()));
        }

        let offline_page = Request::get(resolve(&origin, DEFAULT_OFFLINE_PAGE)?);

        Ok(Self {
            generation,
            origin,
            offline_page,
            storage,
            network,
            phase: RwLock::new(Phase::Parsed),
            lifecycle: Mutex::new(()),
        })
    }

    /// Build a manager from loaded configuration.
    pub fn from_config(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin)?;
        Self::new(config.generation.clone(), origin, storage, network)?.with_offline_page(&config.offline_page)
    }

    /// Serve `locator` for navigations that fail while offline.
    pub fn with_offline_page(mut self, locator: &str) -> Result<Self, Error> {
        self.offline_page = Request::get(resolve(&self.origin, locator)?);
        Ok(self)
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn offline_page(&self) -> &Url {
        &self.offline_page.url
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    /// Pick up a generation installed by an earlier process.
    ///
    /// Install writes a bucket only once every entry is fetched, so a bucket
    /// holding entries means the generation is at least installed. An empty
    /// bucket (created through [`CacheStorage::open`]) does not count.
    pub async fn restore(&self) -> Result<Phase, Error> {
        let _lifecycle = self.lifecycle.lock().await;
        let mut phase = self.phase.write().await;
        if *phase == Phase::Parsed && !self.storage.entries(&self.generation).await?.is_empty() {
            tracing::debug!(generation = %self.generation, "found committed generation in storage");
            *phase = Phase::Installed;
        }
        Ok(*phase)
    }

    async fn set_phase(&self, next: Phase) {
        let mut phase = self.phase.write().await;
        tracing::debug!(generation = %self.generation, from = %*phase, to = %next, "phase change");
        *phase = next;
    }
}

impl fmt::Debug for OfflineCacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineCacheManager")
            .field("generation", &self.generation)
            .field("origin", &self.origin.as_str())
            .field("offline_page", &self.offline_page.url.as_str())
            .finish_non_exhaustive()
    }
}
