//! Decide which postings are published.
//!
//! Rules are evaluated in a fixed priority order; the first rule that fires
//! decides. Exclusions sit above inclusions, so a label like "P-3 / G-5"
//! is excluded.

pub mod grade;

use crate::posting::JobPosting;
use grade::{normalize, normalize_grade};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Which rule decided a posting's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Consultancy,
    ExcludedGrade,
    IncludedGrade,
    InternshipCategory,
    InternshipTitle,
    NoMatch,
}

/// Outcome of classifying one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Include(Reason),
    Exclude(Reason),
}

impl Verdict {
    pub fn is_included(self) -> bool {
        matches!(self, Verdict::Include(_))
    }

    pub fn reason(self) -> Reason {
        match self {
            Verdict::Include(r) | Verdict::Exclude(r) => r,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reason::Consultancy => "consultancy",
            Reason::ExcludedGrade => "excluded grade",
            Reason::IncludedGrade => "professional/director grade",
            Reason::InternshipCategory => "internship or fellowship",
            Reason::InternshipTitle => "internship or fellowship in title",
            Reason::NoMatch => "no matching rule",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Include(r) => write!(f, "include ({r})"),
            Verdict::Exclude(r) => write!(f, "exclude ({r})"),
        }
    }
}

/// The text fields the rules look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct Labels<'a> {
    pub title: &'a str,
    pub grade: &'a str,
    pub contract_type: &'a str,
    pub category: &'a str,
}

impl<'a> From<&'a JobPosting> for Labels<'a> {
    fn from(p: &'a JobPosting) -> Self {
        Self {
            title: &p.title,
            grade: &p.grade_label,
            contract_type: &p.contract_type,
            category: &p.category,
        }
    }
}

/// Classify a scraped posting using all of its labelled fields.
pub fn classify(posting: &JobPosting) -> Verdict {
    classify_labels(Labels::from(posting))
}

/// Classify a bare grade label.
pub fn include_grade(label: &str) -> bool {
    classify_labels(Labels {
        grade: label,
        ..Labels::default()
    })
    .is_included()
}

/// Apply the rules in priority order.
pub fn classify_labels(labels: Labels<'_>) -> Verdict {
    let all = format!(
        "{} {} {} {}",
        labels.title, labels.grade, labels.contract_type, labels.category
    );
    if is_consultancy(&all) {
        return Verdict::Exclude(Reason::Consultancy);
    }

    let grade = normalize_grade(labels.grade);
    if is_excluded_grade(&grade) {
        return Verdict::Exclude(Reason::ExcludedGrade);
    }
    if is_included_grade(&grade) {
        return Verdict::Include(Reason::IncludedGrade);
    }

    if [labels.grade, labels.contract_type, labels.category]
        .iter()
        .any(|t| is_internship(t))
    {
        return Verdict::Include(Reason::InternshipCategory);
    }
    if is_internship(labels.title) {
        return Verdict::Include(Reason::InternshipTitle);
    }

    Verdict::Exclude(Reason::NoMatch)
}

fn is_consultancy(text: &str) -> bool {
    let n = normalize(text);
    n.contains("CONSULTANT") || n.contains("CONSULTANC")
}

fn is_internship(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\b(?:INTERN(?:SHIP)?S?|FELLOW(?:SHIP)?S?)\b").expect("intern regex is valid")
    });
    re.is_match(&normalize(text))
}

/// General Service, National Officer and service-contract grades.
fn is_excluded_grade(grade_norm: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"\b(?:G-\d+|SB(?:-\d+)?|LSC(?:-\d+)?|NO(?:-(?:[A-D]|\d+))?)\b|GENERAL SERVICE|NATIONAL OFFICER|SERVICE CONTRACT",
        )
        .expect("excluded grade regex is valid")
    });
    re.is_match(grade_norm)
}

/// P-1 through P-5, D-1 and D-2.
fn is_included_grade(grade_norm: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\b(?:P-[1-5]|D-[12])\b").expect("included grade regex is valid")
    });
    re.is_match(grade_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_professional_and_director_grades_included() {
        for label in ["P-1", "P-2", "P-3", "P-4", "P-5", "D-1", "D-2"] {
            assert!(include_grade(label), "{label} should be included");
        }
    }

    #[test]
    fn test_grade_spellings_included() {
        for label in ["P4", "p 3", "P\u{2013}2", "Grade: P-5", "D1", "P-3 Fixed Term"] {
            assert!(include_grade(label), "{label} should be included");
        }
    }

    #[test]
    fn test_out_of_range_grades_not_included() {
        for label in ["P-6", "P-10", "D-3", "", "Fixed Term", "UNDP3"] {
            assert!(!include_grade(label), "{label} should be excluded");
        }
    }

    #[test]
    fn test_exclusions_always_win() {
        let labels = [
            "Consultancy",
            "P-3 Consultancy",
            "International Consultant",
            "G-5",
            "G6",
            "G-5 / P-2",
            "NO-B",
            "NOC",
            "NO",
            "NO-A, P-4",
            "SB",
            "SB-3",
            "SB 4 / D-1",
            "LSC",
            "LSC-8",
            "P-3 LSC-10",
            "General Service",
            "National Officer",
            "Local Service Contract",
        ];
        for label in labels {
            assert!(!include_grade(label), "{label} should be excluded");
        }
    }

    #[test]
    fn test_internship_and_fellowship_included() {
        for label in ["Internship", "intern", "Fellowship", "Fellow"] {
            assert!(include_grade(label), "{label} should be included");
        }
        assert!(!include_grade("International"));
    }

    #[test]
    fn test_consultancy_in_title_excludes_posting() {
        let verdict = classify_labels(Labels {
            title: "Consultant - Data Analysis",
            grade: "P-3",
            ..Labels::default()
        });
        assert_eq!(verdict, Verdict::Exclude(Reason::Consultancy));
    }

    #[test]
    fn test_internship_from_contract_and_title() {
        let by_contract = classify_labels(Labels {
            title: "Communications Support",
            contract_type: "Internship",
            ..Labels::default()
        });
        assert_eq!(by_contract, Verdict::Include(Reason::InternshipCategory));

        let by_title = classify_labels(Labels {
            title: "Youth Fellow, Population Data",
            ..Labels::default()
        });
        assert_eq!(by_title, Verdict::Include(Reason::InternshipTitle));
    }

    #[test]
    fn test_excluded_grade_beats_internship_title() {
        let verdict = classify_labels(Labels {
            title: "Intern Coordinator",
            grade: "G-6",
            ..Labels::default()
        });
        assert_eq!(verdict, Verdict::Exclude(Reason::ExcludedGrade));
    }

    #[test]
    fn test_unmatched_is_excluded() {
        let verdict = classify_labels(Labels {
            title: "Programme Analyst",
            ..Labels::default()
        });
        assert_eq!(verdict, Verdict::Exclude(Reason::NoMatch));
        assert!(!verdict.is_included());
        assert_eq!(verdict.to_string(), "exclude (no matching rule)");
    }
}
