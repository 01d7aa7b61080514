//! Environment readiness check.
//!
//! Verifies that a cycle can run here: a Chromium binary is reachable, the
//! existing feed parses, and the feed directory accepts new files. Every
//! failure prints the fix.

use crate::acquisition::browser::{chromium_version, find_chromium, CHROMIUM_PATH_ENV};
use crate::cli::output::{self, Styled};
use crate::config::{BrowserConfig, DEFAULT_FEED_PATH};
use crate::feed::{store, FeedDocument};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Args, Debug, Clone, Default)]
pub struct DoctorArgs {
    /// Feed file to inspect
    #[arg(long, env = "VACANCY_FEED_PATH")]
    pub feed: Option<PathBuf>,

    /// Chromium executable
    #[arg(long, env = "VACANCY_FEED_CHROMIUM_PATH")]
    pub chromium: Option<PathBuf>,

    /// Also start and stop a headless browser
    #[arg(long)]
    pub launch: bool,
}

/// State of the feed file on disk.
#[derive(Debug)]
enum FeedState {
    Missing,
    Valid(FeedDocument),
    Invalid(String),
}

fn inspect_feed(path: &Path) -> FeedState {
    match store::load(path) {
        Ok(None) => FeedState::Missing,
        Ok(Some(doc)) => FeedState::Valid(doc),
        Err(e) => FeedState::Invalid(e.to_string()),
    }
}

/// Directory that will receive the feed file.
fn feed_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Probe writability the same way the store writes: a temp file in place.
fn dir_writable(dir: &Path) -> std::result::Result<(), String> {
    if !dir.exists() {
        // The store creates it on first save; check the nearest existing ancestor.
        return match dir.ancestors().find(|a| a.exists()) {
            Some(existing) => dir_writable(existing),
            None => Err(format!("no existing ancestor of {}", dir.display())),
        };
    }
    tempfile::NamedTempFile::new_in(dir)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

async fn headless_launch(chromium: &Path) -> std::result::Result<u64, String> {
    let settings = BrowserConfig {
        chromium_path: Some(chromium.to_path_buf()),
        ..BrowserConfig::default()
    };
    let start = Instant::now();
    let renderer = ChromiumRenderer::new(&settings).map_err(|e| e.to_string())?;
    let context = renderer.launch().await.map_err(|e| e.to_string())?;
    context.close().await.map_err(|e| e.to_string())?;
    Ok(start.elapsed().as_millis() as u64)
}

pub async fn run(args: &DoctorArgs) -> Result<()> {
    let feed_path = args
        .feed
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FEED_PATH));
    let chromium = find_chromium(args.chromium.as_deref());
    let feed = inspect_feed(&feed_path);
    let dir = feed_dir(&feed_path);
    let writable = dir_writable(&dir);
    let launch = match (&chromium, args.launch) {
        (Some(path), true) => Some(headless_launch(path).await),
        _ => None,
    };

    let ready = chromium.is_some()
        && !matches!(feed, FeedState::Invalid(_))
        && writable.is_ok()
        && !matches!(launch, Some(Err(_)));

    if output::is_json() {
        let (feed_status, entries) = match &feed {
            FeedState::Missing => ("missing".to_string(), None),
            FeedState::Valid(doc) => ("valid".to_string(), Some(doc.len())),
            FeedState::Invalid(e) => (format!("invalid: {e}"), None),
        };
        output::print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "chromium_path": chromium.as_ref().map(|p| p.display().to_string()),
            "chromium_version": chromium.as_deref().and_then(chromium_version),
            "headless_launch_ms": launch.as_ref().and_then(|r| r.as_ref().ok()),
            "feed_path": feed_path.display().to_string(),
            "feed_status": feed_status,
            "feed_entries": entries,
            "feed_dir_writable": writable.is_ok(),
            "ready": ready,
        }));
    } else {
        print_human(&Styled::new(), &chromium, launch.as_ref(), &feed_path, &feed, &dir, &writable);
        let s = Styled::new();
        if ready {
            output::print_status(&s, &s.green("READY"), "a cycle can run");
        } else {
            output::print_status(&s, &s.red("NOT READY"), "fix the items marked above");
        }
    }

    if ready {
        Ok(())
    } else {
        anyhow::bail!("environment is not ready")
    }
}

fn print_human(
    s: &Styled,
    chromium: &Option<PathBuf>,
    launch: Option<&std::result::Result<u64, String>>,
    feed_path: &Path,
    feed: &FeedState,
    dir: &Path,
    writable: &std::result::Result<(), String>,
) {
    output::print_header(s);

    output::print_section(s, "Browser");
    match chromium {
        Some(path) => {
            let version = chromium_version(path);
            output::print_check(
                s.ok_sym(),
                "Chromium:",
                &format!(
                    "{} at {}",
                    version.as_deref().unwrap_or("unknown version"),
                    path.display()
                ),
            );
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Fix: install google-chrome or chromium");
            output::print_detail(&format!("Or set {CHROMIUM_PATH_ENV}=/path/to/chrome"));
        }
    }
    match launch {
        Some(Ok(ms)) => output::print_check(
            s.ok_sym(),
            "Headless test:",
            &format!("launched and closed in {ms}ms"),
        ),
        Some(Err(e)) => {
            output::print_check(s.fail_sym(), "Headless test:", &format!("FAILED: {e}"));
            output::print_detail("Missing shared libraries? Try installing chromium's runtime deps.");
        }
        None => {}
    }
    eprintln!();

    output::print_section(s, "Feed");
    match feed {
        FeedState::Missing => output::print_check(
            s.warn_sym(),
            "Feed file:",
            &format!("{} does not exist yet (created on first run)", feed_path.display()),
        ),
        FeedState::Valid(doc) => {
            let built = doc
                .channel
                .last_build_date
                .map(|d| d.to_rfc2822())
                .unwrap_or_else(|| "never".to_string());
            output::print_check(
                s.ok_sym(),
                "Feed file:",
                &format!("{} entries, last built {built}", doc.len()),
            );
        }
        FeedState::Invalid(e) => {
            output::print_check(s.fail_sym(), "Feed file:", e);
            output::print_detail("A cycle refuses to overwrite it. Repair or move the file.");
        }
    }
    match writable {
        Ok(()) => output::print_check(
            s.ok_sym(),
            "Output dir:",
            &format!("{} (writable)", dir.display()),
        ),
        Err(e) => {
            output::print_check(s.fail_sym(), "Output dir:", &format!("{}: {e}", dir.display()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_dir_of_bare_file_is_cwd() {
        assert_eq!(feed_dir(Path::new("feed.xml")), PathBuf::from("."));
        assert_eq!(feed_dir(Path::new("out/feed.xml")), PathBuf::from("out"));
    }

    #[test]
    fn test_inspect_feed_states() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.xml");
        assert!(matches!(inspect_feed(&path), FeedState::Missing));

        std::fs::write(&path, "<html></html>").unwrap();
        assert!(matches!(inspect_feed(&path), FeedState::Invalid(_)));
    }

    #[test]
    fn test_missing_dir_checks_existing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        assert!(dir_writable(&dir.path().join("a/b")).is_ok());
    }
}
