//! Merge newly included postings into the persisted feed.

use super::model::{FeedDocument, FeedEntry};
use crate::posting::JobPosting;
use std::collections::HashSet;

/// Prepend postings whose GUID the feed has not seen, keeping their order.
///
/// Existing entries are never modified, reordered or removed, and a GUID
/// repeated within `postings` is added once. Returns the number added.
pub fn accumulate(doc: &mut FeedDocument, postings: &[JobPosting]) -> usize {
    let mut known: HashSet<&str> = doc.entries.iter().map(|e| e.guid.as_str()).collect();
    let fresh: Vec<FeedEntry> = postings
        .iter()
        .filter(|p| known.insert(p.guid.as_str()))
        .map(FeedEntry::from)
        .collect();

    let added = fresh.len();
    doc.entries.splice(0..0, fresh);
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::feed::model::Channel;
    use chrono::{TimeZone, Utc};

    fn posting(guid: &str, grade: &str) -> JobPosting {
        JobPosting {
            title: format!("Position {guid}"),
            link: format!("https://www.unfpa.org/jobs/{guid}"),
            grade_label: grade.to_string(),
            location: String::new(),
            contract_type: String::new(),
            closing_date: String::new(),
            category: String::new(),
            pub_date: Utc.with_ymd_and_hms(2026, 10, 14, 6, 0, 0).unwrap(),
            description: String::new(),
            guid: guid.to_string(),
        }
    }

    fn included(postings: Vec<JobPosting>) -> Vec<JobPosting> {
        postings.into_iter().filter(|p| classify(p).is_included()).collect()
    }

    fn guids(doc: &FeedDocument) -> Vec<&str> {
        doc.entries.iter().map(|e| e.guid.as_str()).collect()
    }

    #[test]
    fn test_first_run_drops_excluded_grades() {
        let mut doc = FeedDocument::new(Channel::default());
        let batch = included(vec![posting("a", "P-3"), posting("b", "G-5")]);
        assert_eq!(accumulate(&mut doc, &batch), 1);
        assert_eq!(guids(&doc), vec!["a"]);
    }

    #[test]
    fn test_existing_entry_not_duplicated() {
        let mut doc = FeedDocument::new(Channel::default());
        accumulate(&mut doc, &[posting("a", "P-3")]);

        let batch = included(vec![posting("a", "P-3"), posting("c", "D-1")]);
        assert_eq!(accumulate(&mut doc, &batch), 1);
        assert_eq!(guids(&doc), vec!["c", "a"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let batch = vec![posting("a", "P-3"), posting("b", "P-4"), posting("c", "D-2")];
        let mut doc = FeedDocument::new(Channel::default());
        accumulate(&mut doc, &batch);
        let once = doc.clone();

        assert_eq!(accumulate(&mut doc, &batch), 0);
        assert_eq!(doc, once);
    }

    #[test]
    fn test_existing_entries_untouched_and_batch_order_kept() {
        let mut doc = FeedDocument::new(Channel::default());
        accumulate(&mut doc, &[posting("old", "P-1")]);
        let mut changed = posting("old", "P-1");
        changed.title = "Renamed".to_string();

        let added = accumulate(&mut doc, &[posting("x", "P-2"), changed, posting("y", "P-3"), posting("x", "P-2")]);

        assert_eq!(added, 2);
        assert_eq!(guids(&doc), vec!["x", "y", "old"]);
        assert_eq!(doc.entries[2].title, "Position old");
    }
}
