//! Client code for zakatek.
//!
//! This crate provides the network seam, the reqwest transport, locator
//! resolution, the precache manifest and the offline cache manager that ties
//! them to a [`zakatek_core::CacheStorage`].

pub mod fetch;
pub mod manager;
pub mod manifest;
pub mod network;

pub use fetch::{FetchClient, FetchConfig, UrlError, parse_origin, resolve};
pub use manager::{
    ActivationReport, FailedDeletion, InstallReport, OfflineCacheManager, Phase, Served, Source,
    prune_stale_generations,
};
pub use manifest::PrecacheManifest;
pub use network::{Network, NetworkError, OfflineNetwork};
