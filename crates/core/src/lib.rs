//! Core types and shared functionality for zakatek.
//!
//! This crate provides:
//! - Request/response descriptors shared by the cache and the network
//! - Cache storage contract with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheEntry, CacheStorage, EntrySummary, MemoryStorage};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Request, RequestMode, Response};
