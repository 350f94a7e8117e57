//! Site layout and timing for the extraction pipeline.

use karar_core::AppConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a page with no results table is a legitimate empty result.
pub trait EmptyResultSignal: Send + Sync + fmt::Debug {
    fn matches(&self, page_text: &str) -> bool;
}

/// Matches when the page text contains any of the markers.
#[derive(Debug, Clone)]
pub struct TextMarkers(Vec<String>);

impl TextMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(markers.into_iter().map(Into::into).collect())
    }
}

impl Default for TextMarkers {
    fn default() -> Self {
        Self::new(["Sonuç bulunamadı", "sonuç bulunamadı"])
    }
}

impl EmptyResultSignal for TextMarkers {
    fn matches(&self, page_text: &str) -> bool {
        self.0.iter().any(|m| page_text.contains(m.as_str()))
    }
}

/// Where things are on the search site.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub search_url: String,
    pub query_input: String,
    pub submit_button: String,
    pub result_rows: String,
    pub detail_panel: String,
    pub dismiss_control: String,
    pub empty_signal: Arc<dyn EmptyResultSignal>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            search_url: "https://karararama.yargitay.gov.tr/".into(),
            query_input: "#aranan".into(),
            submit_button: "#aramaG".into(),
            result_rows: "#detayAramaSonuclar tbody tr".into(),
            detail_panel: ".card-scroll".into(),
            dismiss_control: ".modal-footer .btn-secondary".into(),
            empty_signal: Arc::new(TextMarkers::default()),
        }
    }
}

impl SiteProfile {
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_empty_signal(mut self, signal: Arc<dyn EmptyResultSignal>) -> Self {
        self.empty_signal = signal;
        self
    }
}

/// Limits and timeouts for one search.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_results: usize,
    pub navigation_timeout: Duration,
    pub results_timeout: Duration,
    pub detail_timeout: Duration,
    /// Detail text must be longer than this many characters to count as loaded.
    pub detail_min_chars: usize,
    pub dismiss_settle: Duration,
    pub poll_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 10,
            navigation_timeout: Duration::from_secs(30),
            results_timeout: Duration::from_secs(15),
            detail_timeout: Duration::from_secs(5),
            detail_min_chars: 20,
            dismiss_settle: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_results: config.max_results,
            navigation_timeout: config.navigation_timeout(),
            results_timeout: config.results_timeout(),
            detail_timeout: config.detail_timeout(),
            ..Self::default()
        }
    }
}
