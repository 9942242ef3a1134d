//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ZAKATEK_*)
//! 2. TOML config file (explicit path, or ZAKATEK_CONFIG_FILE)
//! 3. Built-in defaults
//!
//! The generation id and precache manifest are deploy-time values: bump
//! `generation` whenever the cached assets change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Generation that ships with the current site build.
pub const DEFAULT_GENERATION: &str = "wesoly-zakatek-v1.1";

/// Resources precached by the current site build.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/index.html",
    "/style.css",
    "/script.js",
    "/manifest.json",
    "/sitemap.xml",
    "/robots.txt",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
    "https://fonts.googleapis.com/css2?family=Poppins:wght@300;400;500;600;700&display=swap",
    "https://images.unsplash.com/photo-1544551763-46a013bb70d5?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=300&q=80",
    "https://images.unsplash.com/photo-1551698618-1dfe5d97d256?w=400&h=250&fit=crop",
    "https://images.unsplash.com/photo-1544378730-6f3c834d9b2d?w=400&h=250&fit=crop",
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ZAKATEK_*)
/// 2. TOML config file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Current cache generation; also the bucket name.
    ///
    /// Set via ZAKATEK_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Site origin that relative locators resolve against.
    ///
    /// Set via ZAKATEK_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Ordered precache manifest.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Locator served when a navigation fails offline.
    ///
    /// Set via ZAKATEK_OFFLINE_PAGE environment variable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path to SQLite cache database.
    ///
    /// Set via ZAKATEK_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes accepted per response body.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds. Unset leaves it to the network stack.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// How many times the host retries a failed install.
    #[serde(default = "default_install_attempts")]
    pub install_attempts: u32,

    /// Pause between install attempts in milliseconds.
    #[serde(default = "default_install_retry_delay_ms")]
    pub install_retry_delay_ms: u64,
}

fn default_generation() -> String {
    DEFAULT_GENERATION.into()
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect()
}

fn default_offline_page() -> String {
    "/index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./zakatek-cache.sqlite")
}

fn default_user_agent() -> String {
    "zakatek/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_install_attempts() -> u32 {
    3
}

fn default_install_retry_delay_ms() -> u64 {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            origin: default_origin(),
            precache: default_precache(),
            offline_page: default_offline_page(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
            install_attempts: default_install_attempts(),
            install_retry_delay_ms: default_install_retry_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn install_retry_delay(&self) -> Duration {
        Duration::from_millis(self.install_retry_delay_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ZAKATEK_`
    /// 2. TOML file from `ZAKATEK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("ZAKATEK_CONFIG_FILE").ok().map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Same as [`AppConfig::load`] with an explicit TOML file.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(file)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed("ZAKATEK_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}
