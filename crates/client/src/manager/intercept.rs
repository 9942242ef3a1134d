//! Fetch interception: cache first, then network, then the offline page.

use serde::{Deserialize, Serialize};
use zakatek_core::{Error, Request, Response};

use super::OfflineCacheManager;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Cache,
    Network,
    OfflineFallback,
}

/// A response handed back to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl OfflineCacheManager {
    /// Answer one outgoing request.
    ///
    /// 1. Exact match in the current generation: served, no network access.
    /// 2. Otherwise the network; whatever it answers is returned untouched
    ///    and never stored.
    /// 3. Network failure on a navigation: the cached offline page.
    /// 4. Network failure on anything else: an error for the page to handle.
    pub async fn on_fetch(&self, request: &Request) -> Result<Served, Error> {
        match self.storage.match_entry(&self.generation, request).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, generation = %self.generation, "cache hit");
                return Ok(Served { response, source: Source::Cache });
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "cache lookup failed, trying network");
            }
        }

        let failure = match self.network.fetch(request).await {
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "served from network");
                return Ok(Served { response, source: Source::Network });
            }
            Err(err) => err,
        };

        if !request.is_navigation() {
            tracing::debug!(url = %request.url, mode = %request.mode, error = %failure, "resource unavailable");
            return Err(Error::ResourceUnavailable(format!("{}: {}", request.url, failure)));
        }

        match self.storage.match_entry(&self.generation, &self.offline_page).await {
            Ok(Some(response)) => {
                tracing::info!(url = %request.url, offline_page = %self.offline_page.url, "serving offline page");
                Ok(Served { response, source: Source::OfflineFallback })
            }
            Ok(None) => Err(Error::NavigationFailed(format!(
                "{}: {}; offline page {} is not cached",
                request.url, failure, self.offline_page.url
            ))),
            Err(err) => Err(Error::NavigationFailed(format!(
                "{}: {}; offline page lookup failed: {}",
                request.url, failure, err
            ))),
        }
    }
}
