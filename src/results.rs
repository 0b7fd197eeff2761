use crate::error::PageError;
use std::path::PathBuf;

/// Outcome of link discovery
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Normalized URLs in crawl order, seed first
    pub pages: Vec<String>,

    /// Pages whose links could not be extracted. They stay in `pages`.
    pub fetch_failures: Vec<(String, PageError)>,
}

/// Result of rendering a single page
#[derive(Debug, Clone, PartialEq)]
pub enum PageRenderResult {
    Rendered { url: String, pdf: Vec<u8> },
    Failed { url: String, error: PageError },
}

impl PageRenderResult {
    /// URL this result was produced for
    pub fn url(&self) -> &str {
        match self {
            Self::Rendered { url, .. } | Self::Failed { url, .. } => url,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

/// How rendered pages are turned into files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One merged PDF spanning every rendered page
    #[default]
    Combined,
    /// One PDF per rendered page
    Separate,
}

/// A single PDF ready to be written, tagged with the URL its name derives from
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPdf {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Final output of a run
#[derive(Debug, Clone, PartialEq)]
pub enum OutputDocument {
    Combined { bytes: Vec<u8>, page_count: usize },
    Separate(Vec<TaggedPdf>),
}

/// What a finished run produced and what it had to skip
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub rendered_pages: usize,
    pub render_failures: Vec<(String, PageError)>,
    pub fetch_failures: Vec<(String, PageError)>,
}
