//! A job posting as scraped from one listing row.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One vacancy discovered during the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub title: String,
    /// Absolute URL of the vacancy; the GUID is derived from it.
    pub link: String,
    /// Raw grade text, e.g. "P-3", "G 6", "Consultancy".
    pub grade_label: String,
    pub location: String,
    pub contract_type: String,
    pub closing_date: String,
    pub category: String,
    /// When this cycle discovered the posting.
    pub pub_date: DateTime<Utc>,
    pub description: String,
    pub guid: String,
}

/// Fields read off a listing row, before identity and description are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub title: String,
    pub link: String,
    pub grade: String,
    pub location: String,
    pub contract_type: String,
    pub closing_date: String,
    pub category: String,
}

impl RawRow {
    /// Number of non-empty fields; used to pick the richer of two rows for one link.
    pub fn filled(&self) -> usize {
        [
            &self.title,
            &self.link,
            &self.grade,
            &self.location,
            &self.contract_type,
            &self.closing_date,
            &self.category,
        ]
        .iter()
        .filter(|v| !v.is_empty())
        .count()
    }
}

impl JobPosting {
    /// Finish a row: derive the GUID and synthesize the description.
    pub fn from_row(row: RawRow, organisation: &str, discovered_at: DateTime<Utc>) -> Self {
        let guid = guid_for_link(&row.link);
        let description = describe(&row, organisation);
        Self {
            title: row.title,
            link: row.link,
            grade_label: row.grade,
            location: row.location,
            contract_type: row.contract_type,
            closing_date: row.closing_date,
            category: row.category,
            pub_date: discovered_at,
            description,
            guid,
        }
    }
}

/// 16-digit numeric GUID: the first 64 bits of the link's MD5, mod 10^16.
///
/// Feeds published by earlier releases carry GUIDs in this exact format, so
/// it must not change.
pub fn guid_for_link(link: &str) -> String {
    let digest = md5::compute(link.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.0[..8]);
    let value = u64::from_be_bytes(head) % 10_000_000_000_000_000;
    format!("{value:016}")
}

fn describe(row: &RawRow, organisation: &str) -> String {
    let location = if row.location.is_empty() {
        "Unknown"
    } else {
        row.location.as_str()
    };
    let mut desc = format!(
        "{organisation} has a vacancy for the position of {}. Location: {location}.",
        row.title
    );
    if !row.grade.is_empty() {
        desc.push_str(&format!(" Grade: {}.", row.grade));
    }
    if !row.contract_type.is_empty() {
        desc.push_str(&format!(" Contract type: {}.", row.contract_type));
    }
    if !row.closing_date.is_empty() {
        desc.push_str(&format!(" Closing date: {}.", row.closing_date));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_guid_is_stable_and_sixteen_digits() {
        let a = guid_for_link("https://www.unfpa.org/jobs/programme-specialist-p-3");
        let b = guid_for_link("https://www.unfpa.org/jobs/programme-specialist-p-3");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_guid_differs_per_link() {
        assert_ne!(
            guid_for_link("https://www.unfpa.org/jobs/a"),
            guid_for_link("https://www.unfpa.org/jobs/b")
        );
    }

    #[test]
    fn test_guid_known_value() {
        // md5("") = d41d8cd98f00b204...; 0xd41d8cd98f00b204 mod 10^16
        let expected = 0xd41d_8cd9_8f00_b204_u64 % 10_000_000_000_000_000;
        assert_eq!(guid_for_link(""), format!("{expected:016}"));
    }

    #[test]
    fn test_from_row_builds_description() {
        let row = RawRow {
            title: "Programme Specialist".to_string(),
            link: "https://www.unfpa.org/jobs/programme-specialist".to_string(),
            grade: "P-3".to_string(),
            contract_type: "Fixed Term".to_string(),
            ..RawRow::default()
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let posting = JobPosting::from_row(row, "UNFPA", at);
        assert_eq!(
            posting.description,
            "UNFPA has a vacancy for the position of Programme Specialist. \
             Location: Unknown. Grade: P-3. Contract type: Fixed Term."
        );
        assert_eq!(posting.guid, guid_for_link(&posting.link));
        assert_eq!(posting.pub_date, at);
    }

    #[test]
    fn test_filled_counts_non_empty() {
        let row = RawRow {
            title: "Driver".to_string(),
            link: "https://x/jobs/1".to_string(),
            ..RawRow::default()
        };
        assert_eq!(row.filled(), 2);
    }
}
