//! Show how the filter treats grade labels, without touching the network.

use crate::classify::grade::normalize_grade;
use crate::classify::{classify_labels, Labels, Verdict};
use crate::cli::output::{self, Styled};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Grade labels as they appear on the listing (e.g. "P4", "G-5")
    #[arg(required = true)]
    pub labels: Vec<String>,

    /// Posting title to classify alongside each label
    #[arg(long, default_value = "")]
    pub title: String,

    /// Contract type to classify alongside each label
    #[arg(long, default_value = "")]
    pub contract: String,
}

fn verdicts(args: &ClassifyArgs) -> Vec<(&str, String, Verdict)> {
    args.labels
        .iter()
        .map(|label| {
            let verdict = classify_labels(Labels {
                title: &args.title,
                grade: label,
                contract_type: &args.contract,
                category: "",
            });
            (label.as_str(), normalize_grade(label), verdict)
        })
        .collect()
}

pub async fn run(args: &ClassifyArgs) -> Result<()> {
    let results = verdicts(args);

    if output::is_json() {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|(label, normalized, verdict)| {
                serde_json::json!({
                    "label": label,
                    "normalized": normalized,
                    "included": verdict.is_included(),
                    "reason": verdict.reason().to_string(),
                })
            })
            .collect();
        output::print_json(&serde_json::Value::Array(rows));
        return Ok(());
    }

    let s = Styled::new();
    for (label, normalized, verdict) in &results {
        let sym = if verdict.is_included() {
            s.ok_sym()
        } else {
            s.fail_sym()
        };
        output::print_check(sym, label, &format!("{verdict} {}", s.dim(normalized)));
    }
    Ok(())
}
