//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (KARAR_*)
//! 2. TOML config file (if KARAR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (KARAR_*)
/// 2. TOML config file (if KARAR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite persistent cache.
    ///
    /// Set via KARAR_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// DevTools websocket of a remote browser (e.g. Browserless).
    ///
    /// Set via KARAR_BROWSER_WS_URL. When unset, a local headless Chromium is launched.
    #[serde(default)]
    pub browser_ws_url: Option<String>,

    /// Token for the remote browser, appended as `token=` if the URL has none.
    ///
    /// Set via KARAR_BROWSER_TOKEN environment variable.
    #[serde(default)]
    pub browser_token: Option<String>,

    /// Entry page of the decision search interface.
    ///
    /// Set via KARAR_SEARCH_URL environment variable.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Hot tier lifetime in milliseconds.
    ///
    /// Set via KARAR_HOT_TTL_MS environment variable.
    #[serde(default = "default_hot_ttl_ms")]
    pub hot_ttl_ms: u64,

    /// Age in days after which a persisted result is stale and purgeable.
    ///
    /// Set via KARAR_PERSISTENT_TTL_DAYS environment variable.
    #[serde(default = "default_persistent_ttl_days")]
    pub persistent_ttl_days: u32,

    /// Access count at which a persisted query is flagged popular.
    ///
    /// Set via KARAR_POPULAR_THRESHOLD environment variable.
    #[serde(default = "default_popular_threshold")]
    pub popular_threshold: u32,

    /// Maximum number of decisions extracted per query.
    ///
    /// Set via KARAR_MAX_RESULTS environment variable.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Bound on waiting for one row's detail view, in milliseconds.
    ///
    /// Set via KARAR_DETAIL_TIMEOUT_MS environment variable.
    #[serde(default = "default_detail_timeout_ms")]
    pub detail_timeout_ms: u64,

    /// Bound on waiting for the results table, in milliseconds.
    ///
    /// Set via KARAR_RESULTS_TIMEOUT_MS environment variable.
    #[serde(default = "default_results_timeout_ms")]
    pub results_timeout_ms: u64,

    /// Bound on loading the search entry page, in milliseconds.
    ///
    /// Set via KARAR_NAVIGATION_TIMEOUT_MS environment variable.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Interval between background cache cleanups, in milliseconds.
    ///
    /// Set via KARAR_CLEANUP_INTERVAL_MS environment variable.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// Page texts that mean a search legitimately found nothing.
    ///
    /// Set in the config file as `empty_result_markers = [...]`.
    #[serde(default = "default_empty_result_markers")]
    pub empty_result_markers: Vec<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./karar-cache.sqlite")
}

fn default_search_url() -> String {
    "https://karararama.yargitay.gov.tr/".into()
}

fn default_hot_ttl_ms() -> u64 {
    5 * 60 * 1000
}

fn default_persistent_ttl_days() -> u32 {
    30
}

fn default_popular_threshold() -> u32 {
    5
}

fn default_max_results() -> usize {
    10
}

fn default_detail_timeout_ms() -> u64 {
    5_000
}

fn default_results_timeout_ms() -> u64 {
    15_000
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_cleanup_interval_ms() -> u64 {
    60 * 60 * 1000
}

fn default_empty_result_markers() -> Vec<String> {
    vec!["Sonuç bulunamadı".into(), "sonuç bulunamadı".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            browser_ws_url: None,
            browser_token: None,
            search_url: default_search_url(),
            hot_ttl_ms: default_hot_ttl_ms(),
            persistent_ttl_days: default_persistent_ttl_days(),
            popular_threshold: default_popular_threshold(),
            max_results: default_max_results(),
            detail_timeout_ms: default_detail_timeout_ms(),
            results_timeout_ms: default_results_timeout_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            empty_result_markers: default_empty_result_markers(),
        }
    }
}

impl AppConfig {
    pub fn hot_ttl(&self) -> Duration {
        Duration::from_millis(self.hot_ttl_ms)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_millis(self.results_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    /// Remote browser endpoint with the token folded into the query string.
    ///
    /// `http(s)://` is rewritten to `ws(s)://`. Returns None when no remote
    /// browser is configured.
    pub fn browser_endpoint(&self) -> Option<String> {
        let raw = self.browser_ws_url.as_deref()?.trim();
        let mut url = match raw.strip_prefix("http") {
            Some(rest) => format!("ws{rest}"),
            None => raw.to_string(),
        };

        if let Some(token) = self.browser_token.as_deref()
            && !url.contains("token=")
        {
            let sep = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{sep}token={token}");
        }

        Some(url)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `KARAR_`
    /// 2. TOML file from `KARAR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("KARAR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("KARAR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Log the effective configuration without secrets.
    pub fn log_summary(&self) {
        tracing::info!(
            db_path = %self.db_path.display(),
            search_url = %self.search_url,
            remote_browser = self.browser_ws_url.is_some(),
            browser_token = self.browser_token.is_some(),
            hot_ttl_ms = self.hot_ttl_ms,
            persistent_ttl_days = self.persistent_ttl_days,
            popular_threshold = self.popular_threshold,
            max_results = self.max_results,
            "configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./karar-cache.sqlite"));
        assert_eq!(config.search_url, "https://karararama.yargitay.gov.tr/");
        assert_eq!(config.hot_ttl_ms, 300_000);
        assert_eq!(config.persistent_ttl_days, 30);
        assert_eq!(config.popular_threshold, 5);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.empty_result_markers, vec!["Sonuç bulunamadı", "sonuç bulunamadı"]);
        assert!(config.browser_ws_url.is_none());
        assert!(config.browser_endpoint().is_none());
    }

    #[test]
    fn test_duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.hot_ttl(), Duration::from_secs(300));
        assert_eq!(config.detail_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.results_timeout(), Duration::from_millis(15_000));
        assert_eq!(config.navigation_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_browser_endpoint_appends_token() {
        let config = AppConfig {
            browser_ws_url: Some("https://chrome.browserless.io".into()),
            browser_token: Some("secret".into()),
            ..Default::default()
        };
        assert_eq!(config.browser_endpoint().unwrap(), "wss://chrome.browserless.io?token=secret");
    }

    #[test]
    fn test_browser_endpoint_keeps_existing_token() {
        let config = AppConfig {
            browser_ws_url: Some("ws://localhost:3000?token=abc".into()),
            browser_token: Some("other".into()),
            ..Default::default()
        };
        assert_eq!(config.browser_endpoint().unwrap(), "ws://localhost:3000?token=abc");
    }

    #[test]
    fn test_browser_endpoint_with_existing_query() {
        let config = AppConfig {
            browser_ws_url: Some("ws://localhost:3000?stealth=true".into()),
            browser_token: Some("t".into()),
            ..Default::default()
        };
        assert_eq!(config.browser_endpoint().unwrap(), "ws://localhost:3000?stealth=true&token=t");
    }
}
