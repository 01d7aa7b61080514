//! Browser rendering abstraction.
//!
//! The listing site fills its rows client-side, so pages are rendered in a
//! real browser. Everything downstream only sees [`NavigationResult::html`];
//! any engine can sit behind these traits.

pub mod chromium;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// How long to wait for a page and what "ready" means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound for load plus readiness.
    pub timeout: Duration,
    /// CSS selector that must match before the page counts as rendered.
    pub ready_selector: Option<String>,
    /// Pause after the selector matched, for rows inserted late.
    pub settle: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            ready_selector: None,
            settle: Duration::ZERO,
        }
    }
}

/// Outcome of rendering one URL.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    /// Serialized DOM after scripts ran.
    pub html: String,
    pub load_time_ms: u64,
}

/// Starts browser sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Launch a session. The caller must [`RenderContext::close`] it.
    async fn launch(&self) -> Result<Box<dyn RenderContext>>;
}

/// One live browser session.
#[async_trait]
pub trait RenderContext: Send {
    /// Load `url` and return the rendered markup once `wait` is satisfied.
    async fn navigate(&mut self, url: &str, wait: &WaitPolicy) -> Result<NavigationResult>;

    /// Tear the session down and release the browser process.
    async fn close(self: Box<Self>) -> Result<()>;
}
