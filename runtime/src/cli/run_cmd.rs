//! Run one scrape-classify-publish cycle.

use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::feed::to_rss;
use crate::pipeline::{run_cycle, CycleReport, Persist};
use crate::renderer::chromium::ChromiumRenderer;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Options for `vacancy-feed run`. Unset values fall back to [`Config::default`].
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Feed file to read and update
    #[arg(long, env = "VACANCY_FEED_PATH")]
    pub feed: Option<PathBuf>,

    /// Listing page to scrape
    #[arg(long, env = "VACANCY_FEED_URL")]
    pub url: Option<String>,

    /// Stop after this many postings pass the filter
    #[arg(long, env = "VACANCY_FEED_MAX_INCLUDED")]
    pub max_included: Option<usize>,

    /// Maximum listing pages to visit
    #[arg(long, env = "VACANCY_FEED_MAX_PAGES")]
    pub max_pages: Option<usize>,

    /// Seconds one page may take to show listing rows
    #[arg(long, env = "VACANCY_FEED_PAGE_TIMEOUT")]
    pub page_timeout: Option<u64>,

    /// Seconds to wait after rows appear
    #[arg(long, env = "VACANCY_FEED_SETTLE")]
    pub settle: Option<u64>,

    /// Seconds the whole scrape may take
    #[arg(long, env = "VACANCY_FEED_CYCLE_TIMEOUT")]
    pub cycle_timeout: Option<u64>,

    /// Chromium executable
    #[arg(long, env = "VACANCY_FEED_CHROMIUM_PATH")]
    pub chromium: Option<PathBuf>,

    /// Keep the Chromium sandbox enabled
    #[arg(long, env = "VACANCY_FEED_SANDBOX")]
    pub sandbox: bool,

    /// Print the resulting feed instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Overlay the given options onto the defaults.
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        if let Some(feed) = &self.feed {
            config.feed_path = feed.clone();
        }
        if let Some(url) = &self.url {
            config.listing_url = url.clone();
        }
        if let Some(n) = self.max_included {
            config.max_included = n;
        }
        if let Some(n) = self.max_pages {
            config.max_pages = n;
        }
        if let Some(secs) = self.page_timeout {
            config.page_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.settle {
            config.settle = Duration::from_secs(secs);
        }
        if let Some(secs) = self.cycle_timeout {
            config.cycle_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = &self.chromium {
            config.browser.chromium_path = Some(path.clone());
        }
        config.browser.sandbox = self.sandbox;
        config
    }
}

pub async fn run(args: &RunArgs) -> Result<()> {
    let config = args.to_config();
    if output::is_verbose() && !output::is_json() {
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&config).context("failed to render config")?
        );
    }

    let renderer = ChromiumRenderer::new(&config.browser)?;
    let persist = if args.dry_run {
        Persist::DryRun
    } else {
        Persist::Save
    };
    let outcome = run_cycle(&config, &renderer, persist)
        .await
        .with_context(|| format!("cycle for {} failed", config.listing_url))?;

    let xml = if args.dry_run {
        Some(to_rss(&outcome.document).context("failed to render feed")?)
    } else {
        None
    };

    if output::is_json() {
        output::print_json(&json_summary(&config, &outcome.report, xml.as_deref()));
        return Ok(());
    }

    if let Some(xml) = &xml {
        println!("{xml}");
    }
    if !output::is_quiet() {
        print_report(&Styled::new(), &config, &outcome.report, args.dry_run);
    }
    Ok(())
}

/// The single JSON document printed for `--json`; a dry run's feed rides along in `xml`.
fn json_summary(config: &Config, report: &CycleReport, xml: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "feed": config.feed_path.display().to_string(),
        "report": report,
        "xml": xml,
    })
}

fn print_report(s: &Styled, config: &Config, report: &CycleReport, dry_run: bool) {
    let target = if report.saved {
        config.feed_path.display().to_string()
    } else if dry_run {
        "not written (dry run)".to_string()
    } else {
        format!("{} (unchanged)", config.feed_path.display())
    };
    eprintln!(
        "  {} {} new, {} total in {}",
        s.ok_sym(),
        s.bold(&report.added.to_string()),
        report.total,
        target
    );
    eprintln!(
        "    {}",
        s.dim(&format!(
            "{} pages, {} postings seen, {} matched, {}",
            report.pages,
            report.seen,
            report.included,
            output::format_millis(report.duration_ms)
        ))
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_args_keep_defaults() {
        let config = RunArgs::default().to_config();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_args_override_defaults() {
        let args = RunArgs {
            feed: Some(PathBuf::from("out/feed.xml")),
            max_pages: Some(2),
            settle: Some(0),
            sandbox: true,
            ..RunArgs::default()
        };
        let config = args.to_config();
        assert_eq!(config.feed_path, PathBuf::from("out/feed.xml"));
        assert_eq!(config.max_pages, 2);
        assert_eq!(config.settle, Duration::ZERO);
        assert!(config.browser.sandbox);
        assert_eq!(config.max_included, 50);
    }

    #[test]
    fn test_json_summary_embeds_dry_run_feed() {
        let report = CycleReport {
            pages: 1,
            seen: 2,
            included: 1,
            added: 1,
            total: 1,
            saved: false,
            duration_ms: 10,
        };
        let value = json_summary(&Config::default(), &report, Some("<rss/>"));
        assert_eq!(value["xml"], "<rss/>");
        assert_eq!(value["report"]["added"], 1);

        let value = json_summary(&Config::default(), &report, None);
        assert!(value["xml"].is_null());
    }
}
