//! DOM helpers for reading text and labelled values out of a listing card.

use scraper::{ElementRef, Selector};

/// Visible text of an element with whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse(&el.text().collect::<Vec<_>>().join(" "))
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first element matching `css` under `root`, if any.
pub fn first_text(root: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    root.select(&sel).next().map(element_text)
}

/// Value shown next to a label such as "Grade" or "Location".
///
/// Finds the first element under `root` whose own text mentions `label`, then
/// reads the value from, in order: that element's remaining text
/// ("Grade: P-3"), its next sibling element (`<dt>Grade</dt><dd>P-3</dd>`),
/// or its parent's remaining text (`<div><b>Grade</b> P-3</div>`).
pub fn field_by_label(root: ElementRef<'_>, label: &str) -> String {
    for node in root.descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let mentions = el
            .children()
            .filter_map(|c| c.value().as_text())
            .any(|t| t.contains(label));
        if !mentions {
            continue;
        }

        let own = strip_label(&element_text(el), label);
        if !own.is_empty() {
            return own;
        }

        if let Some(next) = el.next_siblings().find_map(ElementRef::wrap) {
            let value = element_text(next);
            if !value.is_empty() {
                return value;
            }
        }

        if el.id() != root.id() {
            if let Some(parent) = el.parent().and_then(ElementRef::wrap) {
                let value = strip_label(&element_text(parent), label);
                if !value.is_empty() {
                    return value;
                }
            }
        }
    }
    String::new()
}

/// First non-empty labelled value among `labels`.
pub fn field_by_labels(root: ElementRef<'_>, labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| field_by_label(root, label))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

fn strip_label(text: &str, label: &str) -> String {
    text.replace(label, "")
        .trim()
        .trim_start_matches(':')
        .trim()
        .to_string()
}
