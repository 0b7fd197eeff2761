//! Error types for site2pdf.
//!
//! [`PageError`] is per page and never escapes the task that produced it: the
//! crawler turns it into a skipped link source and the scheduler into a
//! failed [`crate::results::PageRenderResult`]. Everything else is fatal for
//! the run and ends up in [`PipelineError`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A single page could not be fetched or rendered.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PageError {
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("PDF capture timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("PDF capture failed: {0}")]
    Render(String),

    /// The per-page WebDriver session could not be opened.
    #[error("could not open render session: {0}")]
    Session(String),
}

/// Failures while combining rendered pages into output documents.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("no pages were rendered successfully")]
    NoPagesRendered,

    #[error("rendered output for {url} is not a valid PDF: {reason}")]
    MalformedPdf { url: String, reason: String },

    #[error("failed to serialize merged PDF: {0}")]
    Serialize(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a seed URL is required")]
    MissingSeed,

    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("invalid URL pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("could not read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The shared WebDriver session could not be established.
#[derive(Debug, Error)]
#[error("failed to connect to WebDriver at {url}: {reason}")]
pub struct BrowserError {
    pub url: String,
    pub reason: String,
}

/// Fatal errors returned from a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}
