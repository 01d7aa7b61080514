//! One feed cycle: load, render, extract, classify, merge, write.
//!
//! The feed file is read before the browser starts and written only after
//! every page was fetched successfully, so a failed cycle never replaces
//! good data with a partial result.

use crate::acquisition::fetcher::{fetch_listing, listing_wait};
use crate::classify::classify;
use crate::config::Config;
use crate::error::{FeedError, FetchError, Result};
use crate::extraction::{extract_postings, find_next_page};
use crate::feed::model::{Channel, FeedDocument};
use crate::feed::{accumulate, store};
use crate::posting::JobPosting;
use crate::renderer::{RenderContext, Renderer};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Whether the merged feed is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Save,
    DryRun,
}

/// Counters describing one cycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CycleReport {
    pub pages: usize,
    /// Distinct postings seen on the listing.
    pub seen: usize,
    pub included: usize,
    /// Included postings that were not yet in the feed.
    pub added: usize,
    /// Entries in the feed after the merge.
    pub total: usize,
    pub saved: bool,
    pub duration_ms: u64,
}

/// Result of a successful cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub report: CycleReport,
    pub document: FeedDocument,
}

/// Run one complete cycle against `renderer`.
pub async fn run_cycle(
    config: &Config,
    renderer: &dyn Renderer,
    persist: Persist,
) -> Result<CycleOutcome> {
    let start = Instant::now();
    config.validate()?;

    let mut document = match store::load(&config.feed_path)? {
        Some(doc) => {
            info!(path = %config.feed_path.display(), entries = doc.len(), "existing feed loaded");
            doc
        }
        None => {
            info!(path = %config.feed_path.display(), "no feed yet, starting empty");
            FeedDocument::new(Channel::from(&config.channel))
        }
    };
    document.apply_channel(&config.channel);

    let now = Utc::now().trunc_subsecs(0);
    let scrape = scrape_with_session(config, renderer, now).await?;

    // An unparsed listing with nothing included leaves the feed file untouched.
    let untouched = scrape.parse_failed && scrape.included.is_empty();
    let added = if untouched {
        warn!(path = %config.feed_path.display(), "listing not parsed, feed left unchanged");
        0
    } else {
        let added = accumulate(&mut document, &scrape.included);
        document.channel.last_build_date = Some(now.fixed_offset());
        added
    };

    let saved = match persist {
        Persist::Save if !untouched => {
            store::save(&config.feed_path, &document)?;
            info!(path = %config.feed_path.display(), "feed written");
            true
        }
        _ => false,
    };

    let report = CycleReport {
        pages: scrape.pages,
        seen: scrape.seen,
        included: scrape.included.len(),
        added,
        total: document.len(),
        saved,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        pages = report.pages,
        seen = report.seen,
        included = report.included,
        added = report.added,
        total = report.total,
        "cycle complete"
    );
    Ok(CycleOutcome { report, document })
}

struct Scrape {
    pages: usize,
    seen: usize,
    included: Vec<JobPosting>,
    /// A page had content but no recognisable rows.
    parse_failed: bool,
}

/// Own the browser session for the duration of the scrape and release it
/// on every path, including timeouts and errors.
async fn scrape_with_session(
    config: &Config,
    renderer: &dyn Renderer,
    now: DateTime<Utc>,
) -> Result<Scrape> {
    let mut context = renderer.launch().await?;
    let outcome =
        tokio::time::timeout(config.cycle_timeout, scrape(context.as_mut(), config, now)).await;

    if let Err(e) = context.close().await {
        warn!("{e}");
    }

    match outcome {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: config.listing_url.clone(),
            timeout: config.cycle_timeout,
        }
        .into()),
    }
}

async fn scrape(
    context: &mut dyn RenderContext,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<Scrape> {
    let wait = listing_wait(config);
    let mut url = Url::parse(&config.listing_url)
        .map_err(|e| FeedError::Configuration(format!("listing URL: {e}")))?;

    let mut visited: HashSet<String> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut included: Vec<JobPosting> = Vec::new();
    let mut pages = 0;
    let mut parse_failed = false;

    loop {
        visited.insert(url.to_string());
        let page = match fetch_listing(context, &url, &wait).await {
            Ok(page) => page,
            // A page past the first with no rows is the end of the listing.
            Err(FeedError::Fetch(FetchError::NoListings { .. })) if pages > 0 => {
                info!(%url, "later page shows no listings, stopping");
                break;
            }
            Err(e) => return Err(e),
        };
        pages += 1;

        let postings = match extract_postings(
            &page.html,
            &page.url,
            &config.channel.organisation,
            now,
        ) {
            Ok(postings) => postings,
            Err(e @ FeedError::Parse { .. }) => {
                warn!("{e}; the listing layout may have changed");
                parse_failed = true;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if postings.is_empty() {
            info!(page = pages, "no postings on page, stopping");
            break;
        }

        let rows = postings.len();
        let before = included.len();
        for posting in postings {
            if included.len() >= config.max_included {
                break;
            }
            if !seen.insert(posting.guid.clone()) {
                continue;
            }
            let verdict = classify(&posting);
            debug!(
                title = %posting.title,
                grade = %posting.grade_label,
                contract = %posting.contract_type,
                %verdict,
                "classified"
            );
            if verdict.is_included() {
                included.push(posting);
            }
        }
        info!(
            page = pages,
            rows,
            included = included.len() - before,
            total_included = included.len(),
            "page processed"
        );

        if included.len() >= config.max_included {
            info!(limit = config.max_included, "inclusion limit reached");
            break;
        }
        if pages >= config.max_pages {
            info!(limit = config.max_pages, "page limit reached");
            break;
        }
        match find_next_page(&page.html, &page.url) {
            Some(next) if !visited.contains(next.as_str()) => url = next,
            _ => {
                info!(page = pages, "no further pages");
                break;
            }
        }
    }

    Ok(Scrape {
        pages,
        seen: seen.len(),
        included,
        parse_failed,
    })
}
