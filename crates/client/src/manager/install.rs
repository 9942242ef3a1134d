//! Install: precache the manifest as a new generation.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use zakatek_core::{CacheEntry, Error};

use super::{OfflineCacheManager, Phase};
use crate::manifest::PrecacheManifest;

/// Outcome of a committed install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub generation: String,
    pub entries: usize,
    pub bytes: usize,
    pub installed_at: String,
}

impl OfflineCacheManager {
    /// Fetch every manifest entry and commit them as this generation.
    ///
    /// All fetches run concurrently and each must answer with a 2xx status.
    /// The first failure aborts the rest and nothing is written, so an older
    /// generation keeps serving. Re-installing a committed generation
    /// replaces its entries.
    ///
    /// Waits for any install or activation already running on this manager.
    pub async fn on_install(&self, manifest: &PrecacheManifest) -> Result<InstallReport, Error> {
        let _lifecycle = self.lifecycle.lock().await;
        let previous = self.phase().await;
        self.set_phase(Phase::Installing).await;

        match self.precache(manifest).await {
            Ok(report) => {
                let next = if previous == Phase::Activated { Phase::Activated } else { Phase::Installed };
                self.set_phase(next).await;
                tracing::info!(
                    generation = %report.generation,
                    entries = report.entries,
                    bytes = report.bytes,
                    "install committed"
                );
                Ok(report)
            }
            Err(err) => {
                let next = match previous {
                    Phase::Installed | Phase::Activated => previous,
                    _ => Phase::Redundant,
                };
                self.set_phase(next).await;
                tracing::warn!(generation = %self.generation, error = %err, "install failed");
                Err(err)
            }
        }
    }

    async fn precache(&self, manifest: &PrecacheManifest) -> Result<InstallReport, Error> {
        if manifest.is_empty() {
            return Err(Error::InvalidInput("precache manifest is empty".into()));
        }

        let requests = manifest.resolve(&self.origin)?;

        let entries = try_join_all(requests.into_iter().map(|(locator, request)| async move {
            let response = self.network.fetch(&request).await.map_err(|e| Error::InstallFailed {
                locator: locator.clone(),
                reason: e.to_string(),
            })?;

            if !response.is_ok() {
                return Err(Error::InstallFailed {
                    locator,
                    reason: Error::HttpStatus { url: request.url.to_string(), status: response.status }.to_string(),
                });
            }

            tracing::debug!(url = %request.url, status = response.status, "precached");
            Ok::<_, Error>(CacheEntry::new(request, response))
        }))
        .await?;

        let bytes: usize = entries.iter().map(|e| e.response.body.len()).sum();
        let count = entries.len();

        self.storage.put_all(&self.generation, entries).await?;

        Ok(InstallReport {
            generation: self.generation.clone(),
            entries: count,
            bytes,
            installed_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
