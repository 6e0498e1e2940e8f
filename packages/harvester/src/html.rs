//! HTML helpers for navigating parsed pages.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::normalize::clean;

/// Parse a static CSS selector.
#[allow(clippy::expect_used)] // Only called with selector literals
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static CARD_BODY: LazyLock<Selector> = LazyLock::new(|| selector(".card .card-body"));
static CARD_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h3, h4"));

/// Text of an element: stripped text nodes joined by spaces, then cleaned.
///
/// # Examples
/// ```
/// use scraper::{Html, Selector};
/// use regwatch_harvester::html::element_text;
///
/// let doc = Html::parse_fragment("<p> Undang-Undang <b>Nomor\n 5</b></p>");
/// let p = doc.select(&Selector::parse("p").unwrap()).next().unwrap();
/// assert_eq!(element_text(p), "Undang-Undang Nomor 5");
/// ```
pub fn element_text(element: ElementRef<'_>) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    clean(&joined)
}

/// Whether an element carries the given class.
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Direct element children carrying the given class.
pub fn child_elements_with_class<'a>(
    parent: ElementRef<'a>,
    class: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| has_class(*el, class))
}

/// Find the first card body whose heading mentions every word.
///
/// The heading is the first `h3`/`h4` inside the card body; matching is
/// case-insensitive and order-independent.
pub fn find_card<'a>(doc: &'a Html, words: &[&str]) -> Option<ElementRef<'a>> {
    doc.select(&CARD_BODY).find(|body| {
        body.select(&CARD_HEADING).next().is_some_and(|heading| {
            let text = element_text(heading).to_lowercase();
            words.iter().all(|w| text.contains(&w.to_lowercase()))
        })
    })
}

/// Resolve a link target against the page it appears on.
///
/// # Examples
/// ```
/// use regwatch_harvester::html::resolve_url;
///
/// assert_eq!(
///     resolve_url("https://peraturan.bpk.go.id/Details/1/uu", "/Download/1/a.pdf").as_deref(),
///     Some("https://peraturan.bpk.go.id/Download/1/a.pdf")
/// );
/// ```
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(String::from),
        Err(_) => Url::parse(href).ok().map(String::from),
    }
}
