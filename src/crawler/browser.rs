//! Concrete browsing sessions
//!
//! - [`HttpLauncher`]: loads the landing page with one GET; there is no
//!   script engine, so the reveal control is never found
//! - [`ChromeLauncher`] (feature `browser`): drives headless Chromium through
//!   the DevTools protocol

use crate::crawler::fetcher::fetch_url;
use crate::crawler::pagination::{BrowserSession, SessionLauncher};
use crate::SessionError;
use async_trait::async_trait;
use reqwest::Client;

/// Opens static sessions by fetching the landing page over HTTP
pub struct HttpLauncher {
    client: Client,
    encoding: String,
}

impl HttpLauncher {
    pub fn new(client: Client, encoding: impl Into<String>) -> Self {
        Self {
            client,
            encoding: encoding.into(),
        }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    type Session = StaticSession;

    async fn open(&self, url: &str) -> Result<StaticSession, SessionError> {
        let result = fetch_url(&self.client, url, &self.encoding)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !result.is_success() {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", result.status_code),
            });
        }

        Ok(StaticSession {
            markup: result.body,
        })
    }
}

/// A page loaded once; it never changes
#[derive(Debug, Clone)]
pub struct StaticSession {
    markup: String,
}

#[async_trait]
impl BrowserSession for StaticSession {
    async fn activate_control(&mut self, _selector: &str) -> Result<bool, SessionError> {
        Ok(false)
    }

    async fn markup(&mut self) -> Result<String, SessionError> {
        Ok(self.markup.clone())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(feature = "browser")]
pub use chrome::{ChromeLauncher, ChromeSession};

#[cfg(feature = "browser")]
mod chrome {
    use super::*;
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    /// Launches a fresh Chromium process per session
    pub struct ChromeLauncher {
        headless: bool,
        request_timeout: Duration,
    }

    impl ChromeLauncher {
        pub fn new(headless: bool, request_timeout: Option<Duration>) -> Self {
            Self {
                headless,
                request_timeout: request_timeout.unwrap_or(Duration::from_secs(30)),
            }
        }
    }

    #[async_trait]
    impl SessionLauncher for ChromeLauncher {
        type Session = ChromeSession;

        async fn open(&self, url: &str) -> Result<ChromeSession, SessionError> {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(self.request_timeout)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage");

            if !self.headless {
                builder = builder.with_head();
            }

            let browser_config = builder.build().map_err(SessionError::Launch)?;

            let (browser, mut handler) = Browser::launch(browser_config)
                .await
                .map_err(|e| SessionError::Launch(e.to_string()))?;

            // The handler must be polled for the browser to make progress
            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let mut session = ChromeSession {
                browser,
                page: None,
                handler_task,
            };

            match session.browser.new_page(url).await {
                Ok(page) => {
                    session.page = Some(page);
                    Ok(session)
                }
                Err(e) => {
                    let _ = session.close().await;
                    Err(SessionError::Navigation {
                        url: url.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }

    /// One Chromium process with a single tab on the feed
    pub struct ChromeSession {
        browser: Browser,
        page: Option<Page>,
        handler_task: JoinHandle<()>,
    }

    impl ChromeSession {
        fn page(&self) -> Result<&Page, SessionError> {
            self.page
                .as_ref()
                .ok_or_else(|| SessionError::Markup("no page open".to_string()))
        }
    }

    #[async_trait]
    impl BrowserSession for ChromeSession {
        async fn activate_control(&mut self, selector: &str) -> Result<bool, SessionError> {
            let page = self.page()?;
            let controls = page
                .find_elements(selector)
                .await
                .map_err(|e| SessionError::Interaction(e.to_string()))?;

            let Some(control) = controls.into_iter().next() else {
                return Ok(false);
            };

            control
                .scroll_into_view()
                .await
                .map_err(|e| SessionError::Interaction(e.to_string()))?;
            control
                .click()
                .await
                .map_err(|e| SessionError::Interaction(e.to_string()))?;

            Ok(true)
        }

        async fn markup(&mut self) -> Result<String, SessionError> {
            self.page()?
                .content()
                .await
                .map_err(|e| SessionError::Markup(e.to_string()))
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            self.page = None;
            let closed = self
                .browser
                .close()
                .await
                .map_err(|e| SessionError::Launch(e.to_string()));
            let _ = self.browser.wait().await;
            self.handler_task.abort();
            closed.map(|_| ())
        }
    }
}
