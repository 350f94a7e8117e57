//! Headless browser sessions for the decision search interface.
//!
//! The extraction pipeline only talks to [`RenderSession`] and
//! [`SessionProvider`]. The chromiumoxide adapter lives in [`chrome`] behind
//! the `render` feature; [`DisabledProvider`] stands in when rendering is
//! compiled out.

#[cfg(feature = "render")]
pub mod chrome;

#[cfg(feature = "render")]
pub use chrome::ChromeSessionProvider;

use karar_core::Error;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to read from the page.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// A bounded wait elapsed.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Selector matched nothing.
    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    /// Interaction with a matched element failed.
    #[error("interaction failed on {selector}: {reason}")]
    Interaction { selector: String, reason: String },

    /// Browser closed unexpectedly.
    #[error("browser closed unexpectedly")]
    BrowserClosed,

    /// Rendering support is not available in this build.
    #[error("rendering disabled")]
    Disabled,
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Disabled => Error::RenderDisabled,
            RenderError::BrowserLaunch(_) | RenderError::BrowserClosed => Error::SessionUnavailable(err.to_string()),
            RenderError::Navigation(_) => Error::NavigationFailed(err.to_string()),
            RenderError::Timeout(_) => Error::SearchTimeout(err.to_string()),
            _ => Error::ExtractFailed(err.to_string()),
        }
    }
}

/// One live page.
///
/// Methods take `&mut self`: a session serves one interaction at a time.
#[async_trait::async_trait]
pub trait RenderSession: Send {
    /// Load `url`, bounded by `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Wait until `selector` matches at least one element.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Whether `selector` currently matches anything.
    async fn exists(&mut self, selector: &str) -> Result<bool, RenderError>;

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), RenderError>;

    async fn click(&mut self, selector: &str) -> Result<(), RenderError>;

    /// Click the `index`-th (0-based) element matching `selector`.
    async fn click_nth(&mut self, selector: &str, index: usize) -> Result<(), RenderError>;

    /// Text of the first element matching `selector`, empty if it has none.
    async fn text_content(&mut self, selector: &str) -> Result<String, RenderError>;

    /// Inner markup of the first element matching `selector`.
    async fn inner_html(&mut self, selector: &str) -> Result<String, RenderError>;

    /// Text of the whole document body.
    async fn page_text(&mut self) -> Result<String, RenderError>;

    /// Trimmed `<td>` texts of every element matching `row_selector`, in
    /// document order.
    async fn row_cells(&mut self, row_selector: &str) -> Result<Vec<Vec<String>>, RenderError>;

    /// Release the page and the browser connection.
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Source of fresh rendering sessions.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError>;

    /// Open and immediately close a session.
    async fn health_check(&self) -> Result<(), RenderError> {
        SessionGuard::new(self.open_session().await?).close().await
    }

    /// Short label for status reports.
    fn mode(&self) -> &'static str;
}

/// Owns an open session and makes sure it gets closed.
///
/// [`SessionGuard::close`] closes the session in place. A guard dropped while
/// it still holds its session, because the owning future was cancelled or
/// panicked, closes the session on a spawned task.
pub struct SessionGuard {
    session: Option<Box<dyn RenderSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RenderSession>) -> Self {
        Self { session: Some(session) }
    }

    pub fn session(&mut self) -> Result<&mut (dyn RenderSession + 'static), RenderError> {
        self.session.as_deref_mut().ok_or(RenderError::BrowserClosed)
    }

    pub async fn close(mut self) -> Result<(), RenderError> {
        match self.session.take() {
            Some(mut session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("rendering session dropped outside a runtime");
            return;
        };
        tracing::debug!("closing abandoned rendering session");
        runtime.spawn(async move {
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "failed to close abandoned rendering session");
            }
        });
    }
}

/// Provider used when no browser is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProvider;

#[async_trait::async_trait]
impl SessionProvider for DisabledProvider {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Err(RenderError::Disabled)
    }

    fn mode(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProvider, ScriptedSite};

    #[tokio::test]
    async fn test_disabled_provider() {
        let provider = DisabledProvider;
        assert!(matches!(provider.open_session().await, Err(RenderError::Disabled)));
        assert!(matches!(provider.health_check().await, Err(RenderError::Disabled)));
        assert_eq!(provider.mode(), "disabled");
    }

    #[test]
    fn test_render_error_mapping() {
        assert!(matches!(Error::from(RenderError::Disabled), Error::RenderDisabled));
        assert!(matches!(
            Error::from(RenderError::BrowserLaunch("refused".into())),
            Error::SessionUnavailable(_)
        ));
        assert!(matches!(Error::from(RenderError::Navigation("dns".into())), Error::NavigationFailed(_)));
        assert!(matches!(Error::from(RenderError::Timeout(15000)), Error::SearchTimeout(_)));
        assert!(matches!(
            Error::from(RenderError::SelectorNotFound("#aranan".into())),
            Error::ExtractFailed(_)
        ));
    }

    #[test]
    fn test_render_error_messages() {
        assert_eq!(RenderError::Timeout(5000).to_string(), "render timeout after 5000ms");
        assert_eq!(
            Error::from(RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into())).to_string(),
            "NAVIGATION_FAILED: navigation failed: net::ERR_NAME_NOT_RESOLVED"
        );
    }

    #[tokio::test]
    async fn test_guard_close_closes_once() {
        let provider = FakeProvider::new(ScriptedSite::with_rows(1));
        let mut guard = SessionGuard::new(provider.open_session().await.unwrap());
        guard.session().unwrap().page_text().await.unwrap();

        guard.close().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(provider.closed(), 1);
    }

    #[tokio::test]
    async fn test_dropped_guard_closes_in_background() {
        let provider = FakeProvider::new(ScriptedSite::with_rows(1));
        let guard = SessionGuard::new(provider.open_session().await.unwrap());

        drop(guard);
        assert_eq!(provider.closed(), 0);
        tokio::task::yield_now().await;
        assert_eq!(provider.closed(), 1);
    }
}
