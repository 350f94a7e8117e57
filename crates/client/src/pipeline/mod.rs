//! Extraction pipeline for the decision search interface.
//!
//! One search drives one rendering session through a fixed sequence:
//! navigate, submit the query, wait for the results table, read the row
//! summaries, then open each row's detail view in turn and read its text.
//! Interaction is strictly sequential: the site shows details in a modal on
//! the results page, so two rows can never be open at once.
//!
//! Whole-search failures are session acquisition, navigation, a results
//! table that never appears without an empty-result signal, and a table with
//! no parsable rows. A failing row only loses its content.

mod profile;

pub use profile::{EmptyResultSignal, PipelineSettings, SiteProfile, TextMarkers};

use crate::content::{self, extract_metadata};
use crate::render::{RenderError, RenderSession, SessionGuard, SessionProvider};
use karar_core::{AppConfig, CONTENT_UNAVAILABLE, Decision, Error};
use std::sync::Arc;
use std::time::Instant;

/// Anything that can turn a query into fresh decisions.
#[async_trait::async_trait]
pub trait DecisionSource: Send + Sync {
    /// Run a search. An empty vector is a valid "no results" answer.
    async fn search(&self, query: &str) -> Result<Vec<Decision>, Error>;
}

/// Summary cells of one results row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowSummary {
    dom_index: usize,
    sequence_no: String,
    chamber: String,
    case_no: String,
    ruling_no: String,
    ruling_date: String,
}

impl RowSummary {
    /// A row is parsable when at least one of its summary cells has text.
    /// Missing trailing cells read as empty.
    fn parse(dom_index: usize, cells: &[String]) -> Option<Self> {
        let cell = |i: usize| cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
        let row = Self {
            dom_index,
            sequence_no: cell(0),
            chamber: cell(1),
            case_no: cell(2),
            ruling_no: cell(3),
            ruling_date: cell(4),
        };
        let empty = [&row.sequence_no, &row.chamber, &row.case_no, &row.ruling_no, &row.ruling_date]
            .iter()
            .all(|c| c.is_empty());
        (!empty).then_some(row)
    }

    /// Attach content and fill blank summary fields from it. The decision's
    /// position is the row's index in the results table.
    fn into_decision(self, content: String) -> Decision {
        let Self { dom_index, sequence_no, chamber, mut case_no, mut ruling_no, mut ruling_date } = self;

        if content != CONTENT_UNAVAILABLE && (case_no.is_empty() || ruling_no.is_empty() || ruling_date.is_empty())
        {
            let meta = extract_metadata(&content);
            if case_no.is_empty() {
                case_no = meta.case_no.unwrap_or_default();
            }
            if ruling_no.is_empty() {
                ruling_no = meta.ruling_no.unwrap_or_default();
            }
            if ruling_date.is_empty() {
                ruling_date = meta.date.unwrap_or_default();
            }
        }

        Decision::new(sequence_no, chamber, case_no, ruling_no, ruling_date, content, dom_index)
    }
}

/// Browser-driven [`DecisionSource`].
pub struct ExtractionPipeline {
    provider: Arc<dyn SessionProvider>,
    profile: SiteProfile,
    settings: PipelineSettings,
}

impl ExtractionPipeline {
    pub fn new(provider: Arc<dyn SessionProvider>, profile: SiteProfile, settings: PipelineSettings) -> Self {
        Self { provider, profile, settings }
    }

    /// Pipeline against the configured search URL and empty-result markers
    /// with the default site layout.
    pub fn from_config(provider: Arc<dyn SessionProvider>, config: &AppConfig) -> Self {
        let profile = SiteProfile::default()
            .with_search_url(&config.search_url)
            .with_empty_signal(Arc::new(TextMarkers::new(config.empty_result_markers.clone())));
        Self::new(provider, profile, PipelineSettings::from_config(config))
    }

    async fn drive(&self, session: &mut dyn RenderSession, query: &str) -> Result<Vec<Decision>, Error> {
        let profile = &self.profile;
        let settings = &self.settings;

        session
            .navigate(&profile.search_url, settings.navigation_timeout)
            .await
            .map_err(|e| Error::NavigationFailed(format!("{}: {e}", profile.search_url)))?;

        self.submit(session, query).await?;

        if let Err(e) = session.wait_for(&profile.result_rows, settings.results_timeout).await {
            let page_text = session.page_text().await.unwrap_or_default();
            if profile.empty_signal.matches(&page_text) {
                tracing::info!(query, "search returned no results");
                return Ok(Vec::new());
            }
            return Err(Error::SearchTimeout(format!("results table did not appear: {e}")));
        }

        let cells = session
            .row_cells(&profile.result_rows)
            .await
            .map_err(|e| Error::UnparsableResults(format!("reading result rows: {e}")))?;
        let total_rows = cells.len();
        let rows: Vec<RowSummary> = cells
            .iter()
            .enumerate()
            .filter_map(|(i, row)| RowSummary::parse(i, row))
            .collect();

        if rows.is_empty() {
            return Err(Error::UnparsableResults(format!("none of {total_rows} result rows could be parsed")));
        }

        let to_fetch = settings.max_results.min(rows.len());
        tracing::info!(query, found = rows.len(), to_fetch, "result rows parsed");

        let mut decisions = Vec::with_capacity(to_fetch);
        for row in rows.into_iter().take(to_fetch) {
            let position = row.dom_index;
            let content = match self.read_detail(session, position).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(query, position, case_no = %row.case_no, error = %e, "decision detail unavailable");
                    CONTENT_UNAVAILABLE.to_string()
                }
            };
            self.dismiss_detail(session).await;
            decisions.push(row.into_decision(content));
        }

        Ok(decisions)
    }

    async fn submit(&self, session: &mut dyn RenderSession, query: &str) -> Result<(), Error> {
        let profile = &self.profile;
        let form_error = |e: RenderError| Error::ExtractFailed(format!("search form: {e}"));

        session
            .wait_for(&profile.query_input, self.settings.results_timeout)
            .await
            .map_err(form_error)?;
        session.type_text(&profile.query_input, query).await.map_err(form_error)?;
        session.click(&profile.submit_button).await.map_err(form_error)?;
        Ok(())
    }

    /// Open row `dom_index`, wait for its detail text, and return it cleaned.
    async fn read_detail(&self, session: &mut dyn RenderSession, dom_index: usize) -> Result<String, RenderError> {
        let profile = &self.profile;
        let settings = &self.settings;

        session.click_nth(&profile.result_rows, dom_index).await?;
        session.wait_for(&profile.detail_panel, settings.detail_timeout).await?;

        tokio::time::timeout(settings.detail_timeout, async {
            loop {
                let text = session.text_content(&profile.detail_panel).await?;
                if text.trim().chars().count() > settings.detail_min_chars {
                    return Ok::<(), RenderError>(());
                }
                tokio::time::sleep(settings.poll_interval).await;
            }
        })
        .await
        .map_err(|_| RenderError::Timeout(settings.detail_timeout.as_millis() as u64))??;

        let html = session.inner_html(&profile.detail_panel).await?;
        Ok(content::clean(&html))
    }

    /// Close the detail view if it offers a dismiss control. Never fails.
    async fn dismiss_detail(&self, session: &mut dyn RenderSession) {
        let control = &self.profile.dismiss_control;
        if !session.exists(control).await.unwrap_or(false) {
            return;
        }
        if let Err(e) = session.click(control).await {
            tracing::debug!(error = %e, "detail dismiss failed");
        }
        tokio::time::sleep(self.settings.dismiss_settle).await;
    }
}

#[async_trait::async_trait]
impl DecisionSource for ExtractionPipeline {
    async fn search(&self, query: &str) -> Result<Vec<Decision>, Error> {
        let started = Instant::now();
        tracing::info!(query, mode = self.provider.mode(), "starting extraction");

        let session = self.provider.open_session().await.map_err(|e| match e {
            RenderError::Disabled => Error::RenderDisabled,
            e => Error::SessionUnavailable(e.to_string()),
        })?;
        let mut guard = SessionGuard::new(session);

        let outcome = match guard.session() {
            Ok(session) => self.drive(session, query).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = guard.close().await {
            tracing::warn!(query, error = %e, "failed to close rendering session");
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(decisions) => tracing::info!(query, result_count = decisions.len(), duration_ms, "extraction finished"),
            Err(e) => tracing::warn!(query, duration_ms, error = %e, "extraction failed"),
        }
        outcome
    }
}
