//! Headless Chromium renderer over the DevTools protocol.

use super::{NavigationResult, RenderContext, Renderer, WaitPolicy};
use crate::acquisition::browser::find_chromium;
use crate::config::BrowserConfig;
use crate::error::{FeedError, FetchError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Interval between readiness probes while waiting for the listing selector.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Launches one headless Chromium per session.
pub struct ChromiumRenderer {
    executable: PathBuf,
    settings: BrowserConfig,
}

impl ChromiumRenderer {
    /// Resolve the Chromium executable now so a missing browser is reported
    /// as a configuration problem before any work starts.
    pub fn new(settings: &BrowserConfig) -> Result<Self> {
        let executable = find_chromium(settings.chromium_path.as_deref()).ok_or_else(|| {
            FeedError::Configuration(
                "Chromium not found; install google-chrome or chromium, \
                 or set VACANCY_FEED_CHROMIUM_PATH"
                    .to_string(),
            )
        })?;
        Ok(Self {
            executable,
            settings: settings.clone(),
        })
    }

    pub fn executable(&self) -> &std::path::Path {
        &self.executable
    }

    fn cdp_config(&self) -> Result<CdpConfig> {
        let (width, height) = self.settings.window;
        let mut builder = CdpConfig::builder()
            .chrome_executable(&self.executable)
            .window_size(width, height)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.settings.user_agent));
        if !self.settings.sandbox {
            builder = builder.no_sandbox();
        }
        builder.build().map_err(FeedError::Configuration)
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self) -> Result<Box<dyn RenderContext>> {
        let config = self.cdp_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("devtools handler stopped: {e}");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(FetchError::Launch(e.to_string()).into());
            }
        };

        info!(executable = %self.executable.display(), "chromium session started");
        Ok(Box::new(ChromiumContext {
            browser,
            page,
            handler,
        }))
    }
}

/// A running browser with one tab.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumContext {
    /// Poll until `selector` matches or `deadline` passes.
    async fn wait_for(&self, url: &str, selector: &str, deadline: Instant) -> Result<()> {
        loop {
            let found = self
                .page
                .find_elements(selector)
                .await
                .map(|els| !els.is_empty())
                .unwrap_or(false);
            if found {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::NoListings {
                    url: url.to_string(),
                    selector: selector.to_string(),
                }
                .into());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, wait: &WaitPolicy) -> Result<NavigationResult> {
        let start = Instant::now();
        let deadline = start + wait.timeout;

        match tokio::time::timeout(wait.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(FetchError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: wait.timeout,
                }
                .into())
            }
        }

        if let Some(selector) = &wait.ready_selector {
            self.wait_for(url, selector, deadline).await?;
        }
        if !wait.settle.is_zero() {
            debug!(settle_ms = wait.settle.as_millis() as u64, "waiting for late rows");
            tokio::time::sleep(wait.settle).await;
        }

        let html = self.page.content().await.map_err(|e| FetchError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            html,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("waiting for chromium to exit failed: {e}");
        }
        self.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| FetchError::Shutdown(e.to_string()).into())
    }
}

impl Drop for ChromiumContext {
    fn drop(&mut self) {
        // Browser's own drop kills the child process if it is still running.
        self.handler.abort();
    }
}
