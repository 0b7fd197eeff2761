use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site2pdf")]
#[command(about = "Crawl a website and render its pages to PDF")]
#[command(version)]
pub struct Args {
    /// Seed URL to start crawling from
    pub url: Option<String>,

    /// Regex a link must match to be crawled (default: starts with the seed URL)
    pub url_pattern: Option<String>,

    /// Write one PDF per page instead of a single merged PDF
    #[arg(short, long)]
    pub separate: bool,

    /// Directory the PDFs are written to
    #[arg(short, long, default_value = "./out")]
    pub output: PathBuf,

    /// Number of pages rendered concurrently
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Wait for images and use high quality image scaling
    #[arg(short, long)]
    pub quality: bool,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides config and WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,
}
