//! Runtime configuration for the asset cache

use std::path::PathBuf;
use std::time::Duration;

/// Default remote image generator
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://image.pollinations.ai";

/// User agent sent with every generator request
pub const DEFAULT_USER_AGENT: &str = "Oracle-Assets/1.0";

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// SQLite file for the durable tier; `None` disables the tier
    pub store_path: Option<PathBuf>,
    /// Base URL of the remote generator (no trailing slash)
    pub remote_base_url: String,
    pub user_agent: String,
    /// Optional transport timeout for generator requests
    pub fetch_timeout: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_path: Some(default_store_path()),
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: None,
        }
    }
}

impl CacheConfig {
    /// Configuration without a durable tier
    pub fn memory_only() -> Self {
        Self {
            store_path: None,
            ..Self::default()
        }
    }
}

/// Returns the default store path: ~/.cache/oracle_assets/assets.db
pub fn default_store_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("oracle_assets")
        .join("assets.db")
}
