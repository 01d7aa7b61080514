//! Fetch rendered listing pages.

use crate::config::{Config, LISTING_SELECTOR};
use crate::error::Result;
use crate::renderer::{RenderContext, WaitPolicy};
use tracing::info;
use url::Url;

/// A rendered listing page.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Where the browser ended up; relative links resolve against this.
    pub url: Url,
    pub html: String,
}

/// Wait policy for listing pages: rows must appear within the page timeout.
pub fn listing_wait(config: &Config) -> WaitPolicy {
    WaitPolicy {
        timeout: config.page_timeout,
        ready_selector: Some(LISTING_SELECTOR.to_string()),
        settle: config.settle,
    }
}

/// Render one listing page. Any failure is a `FetchError`; an unrendered
/// page is never reported as an empty one.
pub async fn fetch_listing(
    context: &mut dyn RenderContext,
    url: &Url,
    wait: &WaitPolicy,
) -> Result<ListingPage> {
    info!(%url, "loading listing page");
    let nav = context.navigate(url.as_str(), wait).await?;
    info!(
        final_url = %nav.final_url,
        bytes = nav.html.len(),
        load_time_ms = nav.load_time_ms,
        "listing page rendered"
    );
    let final_url = Url::parse(&nav.final_url).unwrap_or_else(|_| url.clone());
    Ok(ListingPage {
        url: final_url,
        html: nav.html,
    })
}
