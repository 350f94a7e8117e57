//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms < 100 {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value_ms > 300_000 {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_results` is outside 1..=50
    /// - `hot_ttl_ms` is below 1000ms
    /// - `persistent_ttl_days` or `popular_threshold` is 0
    /// - a wait timeout is outside 100ms..=5min
    /// - `cleanup_interval_ms` is below 1000ms
    /// - `search_url` is empty
    /// - `empty_result_markers` contains a blank marker
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=50).contains(&self.max_results) {
            return Err(invalid("max_results", "must be between 1 and 50"));
        }

        if self.hot_ttl_ms < 1000 {
            return Err(invalid("hot_ttl_ms", "must be at least 1000ms"));
        }

        if self.persistent_ttl_days < 1 {
            return Err(invalid("persistent_ttl_days", "must be at least 1 day"));
        }

        if self.popular_threshold < 1 {
            return Err(invalid("popular_threshold", "must be at least 1"));
        }

        check_timeout("detail_timeout_ms", self.detail_timeout_ms)?;
        check_timeout("results_timeout_ms", self.results_timeout_ms)?;
        check_timeout("navigation_timeout_ms", self.navigation_timeout_ms)?;

        if self.cleanup_interval_ms < 1000 {
            return Err(invalid("cleanup_interval_ms", "must be at least 1000ms"));
        }

        if self.search_url.trim().is_empty() {
            return Err(invalid("search_url", "must not be empty"));
        }

        if self.empty_result_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid("empty_result_markers", "markers must not be blank"));
        }

        if self.browser_token.is_some() && self.browser_ws_url.is_none() {
            tracing::warn!("browser_token is set without browser_ws_url; a local browser will be launched");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(config: &AppConfig) -> Option<String> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_results_bounds() {
        let config = AppConfig { max_results: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("max_results"));

        let config = AppConfig { max_results: 51, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("max_results"));

        let config = AppConfig { max_results: 50, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_hot_ttl_too_small() {
        let config = AppConfig { hot_ttl_ms: 999, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("hot_ttl_ms"));
    }

    #[test]
    fn test_validate_persistent_ttl_zero() {
        let config = AppConfig { persistent_ttl_days: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("persistent_ttl_days"));
    }

    #[test]
    fn test_validate_popular_threshold_zero() {
        let config = AppConfig { popular_threshold: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("popular_threshold"));
    }

    #[test]
    fn test_validate_timeouts() {
        let config = AppConfig { detail_timeout_ms: 50, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("detail_timeout_ms"));

        let config = AppConfig { results_timeout_ms: 301_000, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("results_timeout_ms"));

        let config = AppConfig { navigation_timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_search_url() {
        let config = AppConfig { search_url: "  ".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("search_url"));
    }

    #[test]
    fn test_validate_cleanup_interval() {
        let config = AppConfig { cleanup_interval_ms: 10, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("cleanup_interval_ms"));
    }

    #[test]
    fn test_validate_blank_empty_marker() {
        let config = AppConfig { empty_result_markers: vec!["Sonuç bulunamadı".into(), " ".into()], ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("empty_result_markers"));

        let config = AppConfig { empty_result_markers: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
