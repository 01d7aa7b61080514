//! Turn a rendered listing page into job postings.
//!
//! Three passes run over the same document. The card pass walks from each job
//! link up to its row container and reads labelled metadata. The labelled
//! pass takes the nearest `div` showing "Location" or "Staff grade", for
//! cards without a known class. The anchor pass only keeps the link and its
//! text. Results are merged by link, keeping
//! whichever row carries more fields, so layout changes degrade to bare
//! titles rather than an empty feed.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

use super::fields::{element_text, field_by_labels, first_text};
use crate::config::LISTING_SELECTOR;
use crate::error::{FeedError, Result};
use crate::posting::{JobPosting, RawRow};

/// Path fragment every vacancy link contains.
const JOB_PATH: &str = "/jobs/";
const MIN_TITLE_CHARS: usize = 5;
const CONTAINER_CLASSES: &[&str] = &["views-row", "job", "card", "item", "row"];
/// Labels whose presence marks a `div` as a vacancy card.
const METADATA_LABELS: &[&str] = &["Location", "Staff grade"];
const TITLE_SELECTORS: &[&str] = &["h2", "h3", "h4", ".title", "strong", LISTING_SELECTOR];

/// Extract every posting on one rendered listing page.
///
/// Returns [`FeedError::Parse`] when the page has visible text but no row could
/// be located; an empty page yields an empty list.
pub fn extract_postings(
    html: &str,
    page_url: &Url,
    organisation: &str,
    discovered_at: DateTime<Utc>,
) -> Result<Vec<JobPosting>> {
    let document = Html::parse_document(html);
    let rows = extract_rows(&document, page_url);

    if rows.is_empty() {
        if has_visible_text(&document) {
            return Err(FeedError::Parse {
                url: page_url.to_string(),
            });
        }
        info!(url = %page_url, "listing page is empty");
        return Ok(Vec::new());
    }

    Ok(rows
        .into_iter()
        .map(|row| JobPosting::from_row(row, organisation, discovered_at))
        .collect())
}

fn extract_rows(document: &Html, page_url: &Url) -> Vec<RawRow> {
    let Ok(sel) = Selector::parse(LISTING_SELECTOR) else {
        return Vec::new();
    };

    let anchors: Vec<(ElementRef<'_>, String)> = document
        .select(&sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            job_link(href, page_url).map(|link| (a, link))
        })
        .collect();

    let cards = anchors.iter().map(|(a, link)| card_row(*a, link));
    let labelled = anchors
        .iter()
        .filter_map(|(a, link)| labelled_row(*a, link, page_url, &sel));
    let bare = anchors.iter().map(|(a, link)| anchor_row(*a, link));
    let merged = merge_rows(cards.chain(labelled).chain(bare));
    debug!(anchors = anchors.len(), rows = merged.len(), "extracted listing rows");
    merged
}

/// Resolve `href` and keep it only if it points at a single vacancy.
fn job_link(href: &str, page_url: &Url) -> Option<String> {
    let mut url = page_url.join(href.trim()).ok()?;
    url.set_fragment(None);
    if !url.path().contains(JOB_PATH) {
        return None;
    }
    let root = page_url.path().trim_end_matches('/');
    if url.path().trim_end_matches('/') == root {
        return None;
    }
    Some(url.to_string())
}

/// Nearest row-like ancestor of a job link.
fn container_of(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let ancestors = || anchor.ancestors().filter_map(ElementRef::wrap);

    ancestors()
        .find(|el| {
            el.value().name() == "div"
                && el
                    .value()
                    .attr("class")
                    .is_some_and(|c| CONTAINER_CLASSES.iter().any(|k| c.contains(k)))
        })
        .or_else(|| ancestors().find(|el| el.value().name() == "tr"))
        .or_else(|| ancestors().find(|el| el.value().name() == "li"))
}

fn card_row(anchor: ElementRef<'_>, link: &str) -> RawRow {
    let link_text = element_text(anchor);
    let mut row = RawRow {
        link: link.to_string(),
        ..RawRow::default()
    };

    match container_of(anchor) {
        Some(card) => read_card(card, &mut row),
        None => {
            if usable_title(&link_text) {
                row.title = link_text.clone();
            }
        }
    }

    if row.title.is_empty() && !link_text.eq_ignore_ascii_case("view") {
        row.title = link_text;
    }
    finish_title(row)
}

/// Nearest ancestor `div` that shows metadata labels, whatever its class.
///
/// The `div` must not link to any other vacancy, so a wrapper around the
/// whole listing never counts as one card.
fn labelled_container<'a>(
    anchor: ElementRef<'a>,
    link: &str,
    page_url: &Url,
    sel: &Selector,
) -> Option<ElementRef<'a>> {
    for el in anchor.ancestors().filter_map(ElementRef::wrap) {
        if el.value().name() != "div" {
            continue;
        }
        let single = el
            .select(sel)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| job_link(href, page_url))
            .all(|other| other == link);
        if !single {
            return None;
        }
        let text = element_text(el);
        if METADATA_LABELS.iter().any(|label| text.contains(label)) {
            return Some(el);
        }
    }
    None
}

fn labelled_row(
    anchor: ElementRef<'_>,
    link: &str,
    page_url: &Url,
    sel: &Selector,
) -> Option<RawRow> {
    let card = labelled_container(anchor, link, page_url, sel)?;
    let mut row = RawRow {
        link: link.to_string(),
        ..RawRow::default()
    };
    read_card(card, &mut row);
    if row.title.is_empty() {
        let text = element_text(anchor);
        if usable_title(&text) {
            row.title = text;
        }
    }
    Some(finish_title(row))
}

fn read_card(card: ElementRef<'_>, row: &mut RawRow) {
    row.title = TITLE_SELECTORS
        .iter()
        .filter_map(|css| first_text(card, css))
        .find(|t| usable_title(t))
        .unwrap_or_default();
    row.location = field_by_labels(card, &["Location", "Duty Station"]);
    row.grade = field_by_labels(card, &["Grade", "Staff grade", "Level"]);
    row.contract_type = field_by_labels(card, &["Contract", "Type"]);
    row.closing_date = field_by_labels(card, &["Closing date", "Closing", "Deadline"]);
    row.category = field_by_labels(card, &["Category", "Job category"]);
}

fn anchor_row(anchor: ElementRef<'_>, link: &str) -> RawRow {
    let text = element_text(anchor);
    finish_title(RawRow {
        title: if usable_title(&text) { text } else { String::new() },
        link: link.to_string(),
        ..RawRow::default()
    })
}

/// Fall back to a title built from the URL slug when nothing better exists.
fn finish_title(mut row: RawRow) -> RawRow {
    if row.title.chars().count() < MIN_TITLE_CHARS {
        row.title = title_from_slug(&row.link);
    }
    row
}

fn usable_title(text: &str) -> bool {
    text.chars().count() > MIN_TITLE_CHARS && !text.eq_ignore_ascii_case("view")
}

/// "programme-specialist-p-3" -> "Programme Specialist P 3"
fn title_from_slug(link: &str) -> String {
    let path = Url::parse(link)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| link.to_string());
    let slug = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Merge rows by link, in first-seen order, keeping the better-filled row.
fn merge_rows(rows: impl Iterator<Item = RawRow>) -> Vec<RawRow> {
    let mut merged: Vec<RawRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if row.title.chars().count() < MIN_TITLE_CHARS || row.link.is_empty() {
            continue;
        }
        match index.get(&row.link) {
            Some(&i) => {
                if row.filled() > merged[i].filled() {
                    merged[i] = row;
                }
            }
            None => {
                index.insert(row.link.clone(), merged.len());
                merged.push(row);
            }
        }
    }
    merged
}

fn has_visible_text(document: &Html) -> bool {
    let Ok(body) = Selector::parse("body") else {
        return false;
    };
    document
        .select(&body)
        .next()
        .is_some_and(|b| b.text().any(|t| !t.trim().is_empty()))
}
