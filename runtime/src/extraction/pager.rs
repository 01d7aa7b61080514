//! Locate the "next page" link on a rendered listing.

use scraper::{Html, Selector};
use url::Url;

use super::fields::element_text;

/// Pager markup used by common CMS themes, most specific first.
const NEXT_SELECTORS: &[&str] = &[
    "li.pager-next a",
    "a.pager-next",
    ".pagination .next a",
    "a[rel='next']",
    ".pager__item--next a",
    "li.next a",
    "a[title='Go to next page']",
];

const NEXT_TEXTS: &[&str] = &["next", "next ›", "next »", "›", "»", ">>"];

/// Absolute URL of the next listing page, if the page has one.
pub fn find_next_page(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);

    for css in NEXT_SELECTORS {
        let Ok(sel) = Selector::parse(css) else {
            continue;
        };
        let found = document
            .select(&sel)
            .filter_map(|el| el.value().attr("href"))
            .find_map(|href| resolve(href, page_url));
        if found.is_some() {
            return found;
        }
    }

    let anchors = Selector::parse("a[href]").ok()?;
    document
        .select(&anchors)
        .filter(|el| NEXT_TEXTS.contains(&element_text(*el).to_lowercase().as_str()))
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| resolve(href, page_url))
}

fn resolve(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    (url != *base).then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.unfpa.org/jobs").unwrap()
    }

    #[test]
    fn test_drupal_pager() {
        let html = r#"<ul class="pager"><li class="pager-next"><a href="/jobs?page=1">next ›</a></li></ul>"#;
        let next = find_next_page(html, &base()).unwrap();
        assert_eq!(next.as_str(), "https://www.unfpa.org/jobs?page=1");
    }

    #[test]
    fn test_rel_next() {
        let html = r#"<a rel="next" href="?page=2">2</a>"#;
        let next = find_next_page(html, &base()).unwrap();
        assert_eq!(next.as_str(), "https://www.unfpa.org/jobs?page=2");
    }

    #[test]
    fn test_text_fallback() {
        let html = r#"<nav><a href="/jobs?page=0">1</a><a href="/jobs?page=3"> » </a></nav>"#;
        let next = find_next_page(html, &base()).unwrap();
        assert_eq!(next.as_str(), "https://www.unfpa.org/jobs?page=3");
    }

    #[test]
    fn test_no_pager_or_self_link() {
        assert!(find_next_page("<p>No more</p>", &base()).is_none());
        let html = r##"<li class="next"><a href="#">Next</a></li><a rel="next" href="/jobs">x</a>"##;
        assert!(find_next_page(html, &base()).is_none());
    }
}
