//! Normalize free-text grade labels into a comparable form.
//!
//! Listing sites write the same grade many ways ("P4", "P 4", "p–4").
//! Everything here maps those to "P-4".

use regex::Regex;
use std::sync::OnceLock;

/// Uppercase, ASCII dashes, single spaces, trimmed.
pub fn normalize(text: &str) -> String {
    static DASHES: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let dashes = DASHES.get_or_init(|| {
        Regex::new(r"[\u{2010}-\u{2015}\u{2212}\u{FE58}\u{FE63}\u{FF0D}]")
            .expect("dash regex is valid")
    });
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("space regex is valid"));

    let text = dashes.replace_all(text, "-");
    let text = text.to_uppercase();
    spaces.replace_all(text.trim(), " ").into_owned()
}

/// Full grade normalization: [`normalize`] then canonical `FAMILY-LEVEL` tokens.
pub fn normalize_grade(raw: &str) -> String {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    static NATIONAL: OnceLock<Regex> = OnceLock::new();

    // P4, P 4, P - 4 -> P-4 (also D, G, SB, LSC, NO)
    let numeric = NUMERIC.get_or_init(|| {
        Regex::new(r"\b(P|D|G|SB|LSC|NO)\s*-?\s*(\d+)\b").expect("grade regex is valid")
    });
    // NOA, NO A, NO - A -> NO-A
    let national = NATIONAL.get_or_init(|| {
        Regex::new(r"\bNO\s*-?\s*([A-D])\b").expect("national officer regex is valid")
    });

    let n = normalize(raw);
    let n = numeric.replace_all(&n, "${1}-${2}");
    national.replace_all(&n, "NO-${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unicode_dashes_and_case() {
        assert_eq!(normalize("  p\u{2013}4 "), "P-4");
        assert_eq!(normalize("General\t  Service"), "GENERAL SERVICE");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_grade_compact_and_spaced() {
        assert_eq!(normalize_grade("P4"), "P-4");
        assert_eq!(normalize_grade("p 3"), "P-3");
        assert_eq!(normalize_grade("D - 1"), "D-1");
        assert_eq!(normalize_grade("G6"), "G-6");
        assert_eq!(normalize_grade("LSC10"), "LSC-10");
        assert_eq!(normalize_grade("sb 2"), "SB-2");
    }

    #[test]
    fn test_normalize_grade_national_officer() {
        assert_eq!(normalize_grade("NOA"), "NO-A");
        assert_eq!(normalize_grade("No-c"), "NO-C");
        assert_eq!(normalize_grade("NO B"), "NO-B");
    }

    #[test]
    fn test_normalize_grade_leaves_words_alone() {
        assert_eq!(normalize_grade("Internship"), "INTERNSHIP");
        assert_eq!(normalize_grade("P-5, Fixed Term"), "P-5, FIXED TERM");
    }
}
