//! Browser session lifecycle
//!
//! A session is one browser, one context and one page, owned by a single
//! run. It moves `Unopened -> Open -> Closed` and is never reopened.

use crate::common::{Error, Result};
use crate::driver::{Browser, BrowserContext, BrowserLauncher, LaunchOptions, Page, Viewport};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing acquired yet
    Unopened,
    /// Browser, context and page are live
    Open,
    /// Torn down; terminal
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unopened => write!(f, "unopened"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// How to acquire the session's resources
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub launch: LaunchOptions,
    pub viewport: Viewport,
}

/// Single-use browser session
pub struct BrowserSession {
    state: SessionState,
    browser: Option<Box<dyn Browser>>,
    context: Option<Box<dyn BrowserContext>>,
    page: Option<Box<dyn Page>>,
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unopened,
            browser: None,
            context: None,
            page: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Acquire browser, context and page, in that order
    ///
    /// If any acquisition fails, whatever was already acquired is released
    /// before the error is returned, and the session ends up `Closed`.
    #[tracing::instrument(skip_all, fields(headless = options.launch.headless))]
    pub async fn open(
        &mut self,
        launcher: &dyn BrowserLauncher,
        options: &SessionOptions,
    ) -> Result<()> {
        if self.state != SessionState::Unopened {
            return Err(Error::SessionAcquisition {
                stage: "open".to_string(),
                message: format!("session is already {}", self.state),
            });
        }

        match self.acquire(launcher, options).await {
            Ok(()) => {
                self.state = SessionState::Open;
                tracing::debug!("Browser session open");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Session acquisition failed: {}", e);
                self.release().await;
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    async fn acquire(&mut self, launcher: &dyn BrowserLauncher, options: &SessionOptions) -> Result<()> {
        let browser = launcher
            .launch(&options.launch)
            .await
            .map_err(|e| Error::session_acquisition("browser", &e))?;
        let browser = self.browser.insert(browser);

        let context = browser
            .new_context(options.viewport)
            .await
            .map_err(|e| Error::session_acquisition("context", &e))?;
        let context = self.context.insert(context);

        let page = context
            .new_page()
            .await
            .map_err(|e| Error::session_acquisition("page", &e))?;
        self.page = Some(page);

        Ok(())
    }

    /// The live page
    pub fn page(&self) -> Result<&dyn Page> {
        match (self.state, self.page.as_deref()) {
            (SessionState::Open, Some(page)) => Ok(page),
            _ => Err(Error::SessionNotOpen(self.state.to_string())),
        }
    }

    /// Tear the session down; safe to call in any state, any number of times
    ///
    /// Page, then context, then browser. A failed release is logged and the
    /// next one is still attempted.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.release().await;
        self.state = SessionState::Closed;
        tracing::debug!("Browser session closed");
    }

    async fn release(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close page: {}", e);
            }
        }
        if let Some(mut context) = self.context.take() {
            if let Err(e) = context.close().await {
                tracing::warn!("Failed to close browser context: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
        }
    }
}
