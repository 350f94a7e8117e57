//! Scripted collaborators shared by the pipeline and resolver tests.

use crate::pipeline::{DecisionSource, SiteProfile};
use crate::render::{RenderError, RenderSession, SessionProvider};
use karar_core::cache::{CacheEfficiency, DailyAnalytics, PopularQuery};
use karar_core::{Decision, Error, ResultStore, ScrapeStat, StoredSearch};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake search site shows.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedSite {
    pub navigation_fails: bool,
    /// Navigation never completes.
    pub navigation_hangs: bool,
    /// `None` means the results table never appears.
    pub rows: Option<Vec<Vec<String>>>,
    pub page_text: String,
    /// Detail markup per row; `None` makes that row's detail view fail.
    pub details: Vec<Option<String>>,
    pub dismiss_control: bool,
}

impl ScriptedSite {
    pub fn with_rows(n: usize) -> Self {
        let rows = (1..=n)
            .map(|i| {
                vec![
                    i.to_string(),
                    "2. Hukuk Dairesi".to_string(),
                    format!("2023/{i}"),
                    format!("2024/{i}"),
                    "01.02.2024".to_string(),
                ]
            })
            .collect();
        let details = (1..=n)
            .map(|i| {
                Some(format!(
                    "<div class=\"karar\"><p>Karar metni {i}: davacı ile davalı arasındaki boşanma davası.</p>\
                     <script>track()</script></div>"
                ))
            })
            .collect();
        Self { rows: Some(rows), page_text: "Arama sonuçları".into(), details, dismiss_control: true, ..Self::default() }
    }

    pub fn no_results() -> Self {
        Self { page_text: "Aramanıza uygun sonuç bulunamadı.".into(), ..Self::default() }
    }

    pub fn never_loads() -> Self {
        Self { page_text: "Yükleniyor...".into(), ..Self::default() }
    }
}

#[derive(Debug, Default)]
struct SessionLog {
    opened: usize,
    closed: usize,
    dismissed: usize,
    typed: Vec<String>,
    details_opened: Vec<usize>,
}

/// Hands out sessions over a [`ScriptedSite`] and records what they did.
#[derive(Debug)]
pub(crate) struct FakeProvider {
    site: ScriptedSite,
    unavailable: bool,
    log: Arc<Mutex<SessionLog>>,
}

impl FakeProvider {
    pub fn new(site: ScriptedSite) -> Self {
        Self { site, unavailable: false, log: Arc::default() }
    }

    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::new(ScriptedSite::default()) }
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub fn dismissed(&self) -> usize {
        self.log.lock().unwrap().dismissed
    }

    pub fn typed_queries(&self) -> Vec<String> {
        self.log.lock().unwrap().typed.clone()
    }

    pub fn details_opened(&self) -> Vec<usize> {
        self.log.lock().unwrap().details_opened.clone()
    }
}

#[async_trait::async_trait]
impl SessionProvider for FakeProvider {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        if self.unavailable {
            return Err(RenderError::BrowserLaunch("connection refused".into()));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(FakeSession {
            site: self.site.clone(),
            profile: SiteProfile::default(),
            open_row: None,
            log: self.log.clone(),
        }))
    }

    fn mode(&self) -> &'static str {
        "scripted"
    }
}

struct FakeSession {
    site: ScriptedSite,
    profile: SiteProfile,
    open_row: Option<usize>,
    log: Arc<Mutex<SessionLog>>,
}

impl FakeSession {
    fn open_detail(&self) -> Option<&String> {
        self.open_row.and_then(|i| self.site.details.get(i)).and_then(Option::as_ref)
    }
}

#[async_trait::async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), RenderError> {
        if self.site.navigation_hangs {
            std::future::pending::<()>().await;
        }
        if self.site.navigation_fails {
            return Err(RenderError::Navigation(format!("{url}: net::ERR_CONNECTION_RESET")));
        }
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError> {
        let present = if selector == self.profile.result_rows {
            self.site.rows.is_some()
        } else if selector == self.profile.detail_panel {
            self.open_detail().is_some()
        } else {
            true
        };
        if present { Ok(()) } else { Err(RenderError::Timeout(timeout.as_millis() as u64)) }
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, RenderError> {
        if selector == self.profile.dismiss_control {
            return Ok(self.site.dismiss_control && self.open_row.is_some());
        }
        Ok(true)
    }

    async fn type_text(&mut self, _selector: &str, text: &str) -> Result<(), RenderError> {
        self.log.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), RenderError> {
        if selector == self.profile.dismiss_control {
            self.open_row = None;
            self.log.lock().unwrap().dismissed += 1;
        }
        Ok(())
    }

    async fn click_nth(&mut self, selector: &str, index: usize) -> Result<(), RenderError> {
        let count = self.site.rows.as_ref().map_or(0, Vec::len);
        if index >= count {
            return Err(RenderError::SelectorNotFound(format!("{selector} [{index}]")));
        }
        self.open_row = Some(index);
        self.log.lock().unwrap().details_opened.push(index);
        Ok(())
    }

    async fn text_content(&mut self, selector: &str) -> Result<String, RenderError> {
        self.open_detail().cloned().ok_or_else(|| RenderError::SelectorNotFound(selector.to_string()))
    }

    async fn inner_html(&mut self, selector: &str) -> Result<String, RenderError> {
        self.open_detail().cloned().ok_or_else(|| RenderError::ContentRetrieval(selector.to_string()))
    }

    async fn page_text(&mut self) -> Result<String, RenderError> {
        Ok(self.site.page_text.clone())
    }

    async fn row_cells(&mut self, _row_selector: &str) -> Result<Vec<Vec<String>>, RenderError> {
        Ok(self.site.rows.clone().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// [`DecisionSource`] returning a fixed answer and counting calls.
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    decisions: Vec<Decision>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn returning(decisions: Vec<Decision>) -> Self {
        Self { decisions, ..Self::default() }
    }

    pub fn failing() -> Self {
        let source = Self::default();
        source.failing.store(true, Ordering::SeqCst);
        source
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DecisionSource for FakeSource {
    async fn search(&self, _query: &str) -> Result<Vec<Decision>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SearchTimeout("results table did not appear".into()));
        }
        Ok(self.decisions.clone())
    }
}

/// Decisions shaped like a real result page.
pub(crate) fn sample_decisions(n: usize) -> Vec<Decision> {
    (0..n)
        .map(|i| {
            Decision::new(
                (i + 1).to_string(),
                "2. Hukuk Dairesi",
                format!("2023/{}", i + 1),
                format!("2024/{}", i + 1),
                "01.02.2024",
                format!("Karar metni {}: boşanma davası", i + 1),
                i,
            )
        })
        .collect()
}

/// Delegating [`ResultStore`] that counts persistent lookups.
pub(crate) struct CountingStore {
    inner: Arc<dyn ResultStore>,
    finds: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn ResultStore>) -> Self {
        Self { inner, finds: AtomicUsize::new(0) }
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResultStore for CountingStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredSearch>, Error> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_fingerprint(fingerprint).await
    }

    async fn upsert(&self, query: &str, decisions: &[Decision]) -> Result<i64, Error> {
        self.inner.upsert(query, decisions).await
    }

    async fn touch_access(&self, fingerprint: &str) -> Result<(), Error> {
        self.inner.touch_access(fingerprint).await
    }

    async fn record_stat(&self, stat: &ScrapeStat) -> Result<(), Error> {
        self.inner.record_stat(stat).await
    }

    async fn popular_queries(&self, limit: usize) -> Result<Vec<PopularQuery>, Error> {
        self.inner.popular_queries(limit).await
    }

    async fn analytics(&self, days: u32) -> Result<Vec<DailyAnalytics>, Error> {
        self.inner.analytics(days).await
    }

    async fn cache_efficiency(&self, hours: u32) -> Result<CacheEfficiency, Error> {
        self.inner.cache_efficiency(hours).await
    }

    async fn purge_older_than(&self, days_to_keep: u32) -> Result<u64, Error> {
        self.inner.purge_older_than(days_to_keep).await
    }

    async fn ping(&self) -> Result<(), Error> {
        self.inner.ping().await
    }
}
