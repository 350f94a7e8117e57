//! chromiumoxide-backed sessions.
//!
//! Each session owns its own browser: a freshly launched local headless
//! Chromium, or a connection to a remote DevTools websocket such as
//! Browserless. Closing the session closes the page, then the browser, then
//! stops the CDP event handler. A session dropped without closing still stops
//! its handler.

use super::{RenderError, RenderSession, SessionProvider};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const VIEWPORT: (u32, u32) = (1920, 1080);

/// Interval between selector checks while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens one browser per session.
#[derive(Debug, Clone)]
pub struct ChromeSessionProvider {
    endpoint: Option<String>,
}

impl ChromeSessionProvider {
    /// Launch a local headless Chromium for every session.
    pub fn local() -> Self {
        Self { endpoint: None }
    }

    /// Connect to the remote DevTools websocket at `endpoint` for every session.
    pub fn remote(endpoint: impl Into<String>) -> Self {
        Self { endpoint: Some(endpoint.into()) }
    }

    /// Remote when `endpoint` is set, local otherwise.
    pub fn from_endpoint(endpoint: Option<String>) -> Self {
        match endpoint {
            Some(endpoint) => Self::remote(endpoint),
            None => Self::local(),
        }
    }

    async fn start_browser(&self) -> Result<(Browser, JoinHandle<()>), RenderError> {
        let (browser, mut handler) = match &self.endpoint {
            Some(endpoint) => Browser::connect(endpoint.clone())
                .await
                .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?,
            None => {
                let (width, height) = VIEWPORT;
                let config = BrowserConfig::builder()
                    .no_sandbox()
                    .window_size(width, height)
                    .build()
                    .map_err(RenderError::BrowserLaunch)?;
                Browser::launch(config)
                    .await
                    .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok((browser, handler))
    }
}

#[async_trait::async_trait]
impl SessionProvider for ChromeSessionProvider {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let (mut browser, handler) = self.start_browser().await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                browser.close().await.ok();
                handler.abort();
                return Err(RenderError::BrowserLaunch(e.to_string()));
            }
        };

        tracing::debug!(mode = self.mode(), "rendering session opened");
        Ok(Box::new(ChromeSession { browser, page: Some(page), handler }))
    }

    fn mode(&self) -> &'static str {
        if self.endpoint.is_some() { "remote" } else { "local" }
    }
}

struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, RenderError> {
        self.page.as_ref().ok_or(RenderError::BrowserClosed)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn timeout_ms(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

fn interaction(selector: &str, err: impl std::fmt::Display) -> RenderError {
    RenderError::Interaction { selector: selector.to_string(), reason: err.to_string() }
}

#[async_trait::async_trait]
impl RenderSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        let page = self.page()?;
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| RenderError::Timeout(timeout_ms(timeout)))?
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError> {
        let page = self.page()?;
        tokio::time::timeout(timeout, async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .map_err(|_| RenderError::Timeout(timeout_ms(timeout)))
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, RenderError> {
        let page = self.page()?;
        Ok(page.find_elements(selector).await.map(|els| !els.is_empty()).unwrap_or(false))
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), RenderError> {
        let page = self.page()?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|_| RenderError::SelectorNotFound(selector.to_string()))?;
        element.click().await.map_err(|e| interaction(selector, e))?;
        element.type_str(text).await.map_err(|e| interaction(selector, e))?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), RenderError> {
        let page = self.page()?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|_| RenderError::SelectorNotFound(selector.to_string()))?;
        element.click().await.map_err(|e| interaction(selector, e))?;
        Ok(())
    }

    async fn click_nth(&mut self, selector: &str, index: usize) -> Result<(), RenderError> {
        let page = self.page()?;
        let elements = page
            .find_elements(selector)
            .await
            .map_err(|_| RenderError::SelectorNotFound(selector.to_string()))?;
        let element = elements
            .get(index)
            .ok_or_else(|| RenderError::SelectorNotFound(format!("{selector} [{index}]")))?;
        element.click().await.map_err(|e| interaction(selector, e))?;
        Ok(())
    }

    async fn text_content(&mut self, selector: &str) -> Result<String, RenderError> {
        let page = self.page()?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|_| RenderError::SelectorNotFound(selector.to_string()))?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn inner_html(&mut self, selector: &str) -> Result<String, RenderError> {
        let page = self.page()?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|_| RenderError::SelectorNotFound(selector.to_string()))?;
        let html = element
            .inner_html()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;
        Ok(html.unwrap_or_default())
    }

    async fn page_text(&mut self) -> Result<String, RenderError> {
        let page = self.page()?;
        page.evaluate("document.body ? (document.body.textContent || '') : ''")
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    async fn row_cells(&mut self, row_selector: &str) -> Result<Vec<Vec<String>>, RenderError> {
        let page = self.page()?;
        let selector =
            serde_json::to_string(row_selector).map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;
        let script = format!(
            "Array.from(document.querySelectorAll({selector})).map(tr => \
             Array.from(tr.querySelectorAll('td')).map(td => (td.textContent || '').trim()))"
        );
        page.evaluate(script)
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
            .into_value::<Vec<Vec<String>>>()
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let page_result = match self.page.take() {
            Some(page) => page.close().await.map_err(|e| RenderError::ContentRetrieval(e.to_string())),
            None => Ok(()),
        };
        let browser_result = self.browser.close().await;
        self.handler.abort();
        tracing::debug!("rendering session closed");

        page_result?;
        browser_result.map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_mode() {
        assert_eq!(ChromeSessionProvider::local().mode(), "local");
        assert_eq!(ChromeSessionProvider::remote("ws://localhost:3000").mode(), "remote");
        assert_eq!(ChromeSessionProvider::from_endpoint(None).mode(), "local");
        assert_eq!(
            ChromeSessionProvider::from_endpoint(Some("wss://chrome.browserless.io?token=t".into())).mode(),
            "remote"
        );
    }

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_local_session_lifecycle() {
        let provider = ChromeSessionProvider::local();
        let mut session = provider.open_session().await.unwrap();
        session
            .navigate("data:text/html,<table id=t><tbody><tr><td> 1 </td><td>2. HD</td></tr></tbody></table>", Duration::from_secs(10))
            .await
            .unwrap();
        session.wait_for("#t tbody tr", Duration::from_secs(5)).await.unwrap();
        let rows = session.row_cells("#t tbody tr").await.unwrap();
        assert_eq!(rows, vec![vec!["1".to_string(), "2. HD".to_string()]]);
        assert!(!session.exists(".modal-footer").await.unwrap());
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_wait_for_times_out() {
        let provider = ChromeSessionProvider::local();
        let mut session = provider.open_session().await.unwrap();
        let result = session.wait_for("#missing", Duration::from_millis(600)).await;
        assert!(matches!(result, Err(RenderError::Timeout(600))));
        session.close().await.unwrap();
    }
}
