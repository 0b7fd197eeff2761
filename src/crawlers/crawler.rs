use crate::error::PageError;

/// A page loaded for link discovery
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the page ended up after redirects; relative links resolve against it
    pub location: String,

    /// Raw `href` values in document order
    pub links: Vec<String>,
}

/// Loads a page and reports the links it contains
pub trait LinkSource {
    async fn fetch_links(&self, url: &str) -> Result<FetchedPage, PageError>;
}

/// Renders a page to PDF bytes
///
/// Implementations own whatever per-page session they need and must release
/// it before returning, whether or not rendering succeeded.
pub trait PageRenderer {
    async fn render(&self, url: &str) -> Result<Vec<u8>, PageError>;
}
