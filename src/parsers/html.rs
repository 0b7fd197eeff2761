use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static BASE: Lazy<Selector> = Lazy::new(|| Selector::parse("base[href]").unwrap());

/// Extracts every anchor `href` from an HTML document, in document order
pub fn parse_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let links = doc
        .select(&ANCHOR)
        .filter_map(|e| e.value().attr("href"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} links", links.len());
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }
    links
}

/// The document's `<base href>`, if it declares one
pub fn parse_base_href(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&BASE)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(|s| s.trim().to_string())
}
