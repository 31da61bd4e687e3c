//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with CRITIQUE_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the signing key should be kept in environment variables,
//! not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site/tenant identifier stamped onto every review
    pub id: i32,
    pub name: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Critique".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Review content policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    /// Maximum length of review and segment texts
    pub max_length: usize,
    /// When true, the profanity list is not enforced
    pub allow_profanities: bool,
    /// Disallowed substrings, matched case-insensitively
    pub profanity_list: Vec<String>,
    /// Hide reviews marked as removed from listings
    pub hide_removed: bool,
    /// Name of the active review backend (see crate::backend)
    pub backend: String,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            max_length: 3000,
            allow_profanities: false,
            profanity_list: Vec::new(),
            hide_removed: true,
            backend: crate::backend::DEFAULT_BACKEND.to_string(),
        }
    }
}

/// Security configuration for the form-signing protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Signing key for security stamps and category tokens
    /// (should be in env var CRITIQUE_SECURITY_SECRET_KEY)
    #[serde(default)]
    pub secret_key: String,
    /// Seconds a security stamp stays valid after generation
    pub stamp_window_seconds: u64,
    /// Accept stamps hashed with the pre-HMAC SHA-1 scheme.
    /// Turn off once no forms issued by the old implementation remain live.
    pub legacy_sha1_fallback: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            stamp_window_seconds: 2 * 60 * 60,
            legacy_sha1_fallback: true,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub reviews: ReviewsConfig,
    pub security: SecurityConfig,
    /// When set, rejected submissions carry a diagnostic body.
    /// Never enable in production; the 400 page stays opaque otherwise.
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables (CRITIQUE_ prefix)
            // e.g., CRITIQUE_SECURITY_SECRET_KEY, CRITIQUE_SITE_ID
            .add_source(
                Environment::with_prefix("CRITIQUE")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reload configuration from file
    pub fn reload() -> Result<(), ConfigError> {
        let new_config = Self::load()?;
        if let Ok(mut config) = APP_CONFIG.write() {
            *config = new_config;
            log::info!("Configuration reloaded");
        }
        Ok(())
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = APP_CONFIG.read().unwrap();
    if config.security.secret_key.is_empty() {
        log::warn!(
            "security.secret_key is empty; security stamps and category \
             tokens will not survive a restart"
        );
    }
    log::info!("Configuration loaded: site.name = {}", config.site.name);
}

// Convenience functions for accessing global config

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get site configuration
pub fn site() -> SiteConfig {
    get_config().site
}

/// Get review policy configuration
pub fn reviews() -> ReviewsConfig {
    get_config().reviews
}

/// Get security configuration
pub fn security() -> SecurityConfig {
    get_config().security
}

/// Whether debug diagnostics are enabled
pub fn debug() -> bool {
    get_config().debug
}
