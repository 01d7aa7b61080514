//! Runtime configuration for a feed cycle.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Listing page scraped when no URL is configured.
pub const DEFAULT_LISTING_URL: &str = "https://www.unfpa.org/jobs";
/// Feed file written when no path is configured.
pub const DEFAULT_FEED_PATH: &str = "unfpa_jobs.xml";
/// Selector whose presence marks the listing as rendered.
pub const LISTING_SELECTOR: &str = "a[href*='/jobs/']";

/// Channel-level metadata stamped onto the feed on every cycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelConfig {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    /// Public URL of the feed itself, emitted as `atom:link rel="self"`.
    pub self_link: Option<String>,
    /// Organisation name used in synthesized item descriptions.
    pub organisation: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "UNFPA Job Vacancies".to_string(),
            link: DEFAULT_LISTING_URL.to_string(),
            description: "List of vacancies at UNFPA".to_string(),
            language: "en".to_string(),
            self_link: Some("https://cinfoposte.github.io/unfpa-jobs/unfpa_jobs.xml".to_string()),
            organisation: "UNFPA".to_string(),
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Explicit Chromium executable; discovered when `None`.
    pub chromium_path: Option<PathBuf>,
    /// Run Chromium with its sandbox enabled. Off by default for CI containers.
    pub sandbox: bool,
    pub user_agent: String,
    pub window: (u32, u32),
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chromium_path: None,
            sandbox: false,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            window: (1920, 1080),
        }
    }
}

/// Everything one cycle needs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Config {
    pub listing_url: String,
    pub feed_path: PathBuf,
    /// Stop paging once this many postings passed the classifier.
    pub max_included: usize,
    pub max_pages: usize,
    /// Upper bound for one page to load and show listing rows.
    pub page_timeout: Duration,
    /// Extra wait after listing rows appear, for rows populated late.
    pub settle: Duration,
    /// Upper bound for the whole scrape.
    pub cycle_timeout: Duration,
    pub channel: ChannelConfig,
    pub browser: BrowserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            feed_path: PathBuf::from(DEFAULT_FEED_PATH),
            max_included: 50,
            max_pages: 10,
            page_timeout: Duration::from_secs(60),
            settle: Duration::from_secs(20),
            cycle_timeout: Duration::from_secs(600),
            channel: ChannelConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Config {
    /// Reject values that would make a cycle meaningless.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::FeedError;

        if url::Url::parse(&self.listing_url).is_err() {
            return Err(FeedError::Configuration(format!(
                "listing URL `{}` is not an absolute URL",
                self.listing_url
            )));
        }
        if self.max_included == 0 {
            return Err(FeedError::Configuration(
                "max_included must be at least 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(FeedError::Configuration(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.feed_path.as_os_str().is_empty() {
            return Err(FeedError::Configuration("feed path is empty".to_string()));
        }
        Ok(())
    }
}
