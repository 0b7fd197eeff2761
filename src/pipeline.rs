use crate::assembler::assemble;
use crate::config::ConvertConfig;
use crate::crawlers::{Browser, LinkSource, PageRenderer, crawl};
use crate::error::{ConfigError, PipelineError};
use crate::filter::UrlScope;
use crate::output;
use crate::results::{OutputMode, PageRenderResult, RunSummary};
use crate::scheduler::render_all;
use std::path::PathBuf;
use url::Url;

/// A validated conversion request
#[derive(Debug, Clone)]
pub struct Job {
    pub seed: String,
    pub scope: UrlScope,
    pub mode: OutputMode,
    pub output_dir: PathBuf,
}

impl Job {
    /// Validates the seed and pattern. Nothing touches the network here.
    pub fn new(
        seed: Option<&str>,
        url_pattern: Option<&str>,
        mode: OutputMode,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let seed = seed
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSeed)?;
        // Discovered links come out of `Url::join` in serialized form, so the
        // seed has to be in that form too for prefix matching and dedup.
        let seed = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidSeed {
                url: seed.to_string(),
                reason: e.to_string(),
            })?
            .to_string();

        Ok(Self {
            scope: UrlScope::new(&seed, url_pattern)?,
            seed,
            mode,
            output_dir: output_dir.into(),
        })
    }
}

/// Runs the whole conversion against a WebDriver browser.
///
/// The browser is closed after the run whether or not a stage failed.
pub async fn run(job: &Job, config: &ConvertConfig) -> Result<RunSummary, PipelineError> {
    config.validate()?;

    let browser = Browser::open(config).await?;
    let outcome = run_with(job, config.max_concurrency, &browser, &browser).await;
    browser.close().await;

    outcome
}

/// Crawl, render, assemble and write using the given collaborators
pub async fn run_with<S: LinkSource, R: PageRenderer>(
    job: &Job,
    max_concurrency: usize,
    source: &S,
    renderer: &R,
) -> Result<RunSummary, PipelineError> {
    let report = crawl(&job.seed, &job.scope, source).await;
    for (url, error) in &report.fetch_failures {
        ::log::warn!("Link discovery skipped for {}: {}", url, error);
    }

    let results = render_all(&report.pages, max_concurrency, renderer).await;

    let mut summary = RunSummary {
        fetch_failures: report.fetch_failures,
        rendered_pages: results.iter().filter(|r| r.is_rendered()).count(),
        ..RunSummary::default()
    };
    for result in &results {
        if let PageRenderResult::Failed { url, error } = result {
            ::log::warn!("Skipping page {}: {}", url, error);
            summary.render_failures.push((url.clone(), error.clone()));
        }
    }

    let document = assemble(results, job.mode)?;
    summary.written = output::write_document(&job.output_dir, &job.seed, &document)?;

    ::log::info!(
        "Wrote {} file(s) from {} rendered page(s), {} render failure(s)",
        summary.written.len(),
        summary.rendered_pages,
        summary.render_failures.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::fixtures::{page_widths, sample_pdf};
    use crate::crawlers::FetchedPage;
    use crate::error::{AssembleError, PageError};
    use std::collections::{HashMap, HashSet};

    /// A small site held in memory: links per page, and pages that fail to render
    struct FakeSite {
        links: HashMap<String, Vec<String>>,
        broken: HashSet<String>,
    }

    impl FakeSite {
        /// `/`, `/a` and `/b` all link to each other, to an out-of-scope page
        /// and to a mail address
        fn triangle() -> Self {
            let shared = vec![
                "/".to_string(),
                "/a".to_string(),
                "/b".to_string(),
                "/external".to_string(),
                "mailto:x@y.com".to_string(),
            ];
            let links = ["https://site.test", "https://site.test/a", "https://site.test/b"]
                .into_iter()
                .map(|url| (url.to_string(), shared.clone()))
                .collect();
            Self {
                links,
                broken: HashSet::new(),
            }
        }

        fn width_of(url: &str) -> i64 {
            match url {
                "https://site.test" => 100,
                "https://site.test/a" => 200,
                _ => 300,
            }
        }
    }

    impl LinkSource for FakeSite {
        async fn fetch_links(&self, url: &str) -> Result<FetchedPage, PageError> {
            self.links
                .get(url)
                .map(|links| FetchedPage {
                    location: url.to_string(),
                    links: links.clone(),
                })
                .ok_or_else(|| PageError::Navigation(format!("no page at {url}")))
        }
    }

    impl PageRenderer for FakeSite {
        async fn render(&self, url: &str) -> Result<Vec<u8>, PageError> {
            if self.broken.contains(url) {
                return Err(PageError::RenderTimeout(std::time::Duration::from_secs(60)));
            }
            Ok(sample_pdf(&[Self::width_of(url)]))
        }
    }

    fn job(mode: OutputMode, dir: &std::path::Path) -> Job {
        Job::new(
            Some("https://site.test/"),
            Some(r"^https://site\.test/(a|b)?$"),
            mode,
            dir,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_combined_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let site = FakeSite::triangle();

        let summary = run_with(&job(OutputMode::Combined, dir.path()), 2, &site, &site)
            .await
            .unwrap();

        assert_eq!(summary.rendered_pages, 3);
        assert!(summary.render_failures.is_empty());
        assert!(summary.fetch_failures.is_empty());
        assert_eq!(summary.written, vec![dir.path().join("site-test.pdf")]);

        let bytes = std::fs::read(&summary.written[0]).unwrap();
        assert_eq!(page_widths(&bytes), vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_separate_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let site = FakeSite::triangle();

        let summary = run_with(&job(OutputMode::Separate, dir.path()), 3, &site, &site)
            .await
            .unwrap();

        assert_eq!(
            summary.written,
            vec![
                dir.path().join("site-test.pdf"),
                dir.path().join("site-test-a.pdf"),
                dir.path().join("site-test-b.pdf"),
            ]
        );
        let bytes = std::fs::read(&summary.written[2]).unwrap();
        assert_eq!(page_widths(&bytes), vec![300]);
    }

    #[tokio::test]
    async fn test_partial_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = FakeSite::triangle();
        site.broken.insert("https://site.test/a".to_string());

        let summary = run_with(&job(OutputMode::Combined, dir.path()), 2, &site, &site)
            .await
            .unwrap();

        assert_eq!(summary.rendered_pages, 2);
        assert_eq!(summary.render_failures.len(), 1);
        assert_eq!(summary.render_failures[0].0, "https://site.test/a");
        let bytes = std::fs::read(&summary.written[0]).unwrap();
        assert_eq!(page_widths(&bytes), vec![100, 300]);
    }

    #[tokio::test]
    async fn test_all_renders_failing_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut site = FakeSite::triangle();
        for url in ["https://site.test", "https://site.test/a", "https://site.test/b"] {
            site.broken.insert(url.to_string());
        }

        let err = run_with(&job(OutputMode::Combined, &out), 2, &site, &site)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Assemble(AssembleError::NoPagesRendered)
        ));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_crawl_failures_reported_separately() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = FakeSite::triangle();
        site.links
            .get_mut("https://site.test")
            .unwrap()
            .push("/dead".to_string());
        let job = Job::new(
            Some("https://site.test/"),
            None,
            OutputMode::Combined,
            dir.path(),
        )
        .unwrap();

        let summary = run_with(&job, 2, &site, &site).await.unwrap();

        assert_eq!(summary.fetch_failures.len(), 2);
        let failed: Vec<&str> = summary
            .fetch_failures
            .iter()
            .map(|(url, _)| url.as_str())
            .collect();
        assert!(failed.contains(&"https://site.test/dead"));
        assert!(failed.contains(&"https://site.test/external"));
        // Pages that could not be crawled are still rendered.
        assert_eq!(summary.rendered_pages, 5);
    }

    #[tokio::test]
    async fn test_mixed_case_seed_rendered_once() {
        let dir = tempfile::tempdir().unwrap();
        let site = FakeSite::triangle();
        let job = Job::new(
            Some("https://Site.test/"),
            Some(r"site\.test/(a|b)?$"),
            OutputMode::Combined,
            dir.path(),
        )
        .unwrap();

        let summary = run_with(&job, 2, &site, &site).await.unwrap();

        assert_eq!(summary.rendered_pages, 3);
        assert!(summary.fetch_failures.is_empty());
        assert_eq!(summary.written, vec![dir.path().join("site-test.pdf")]);
        let bytes = std::fs::read(&summary.written[0]).unwrap();
        assert_eq!(page_widths(&bytes), vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_default_port_seed_keeps_prefix_scope() {
        let dir = tempfile::tempdir().unwrap();
        let site = FakeSite::triangle();
        let job = Job::new(
            Some("https://site.test:443/"),
            None,
            OutputMode::Combined,
            dir.path(),
        )
        .unwrap();

        let summary = run_with(&job, 2, &site, &site).await.unwrap();

        // `/external` is in scope under the host prefix but has no page.
        assert_eq!(summary.rendered_pages, 4);
        assert_eq!(summary.fetch_failures.len(), 1);
        assert_eq!(summary.fetch_failures[0].0, "https://site.test/external");
        assert_eq!(summary.written, vec![dir.path().join("site-test.pdf")]);
        let bytes = std::fs::read(&summary.written[0]).unwrap();
        assert_eq!(page_widths(&bytes), vec![100, 200, 300, 300]);
    }

    #[test]
    fn test_job_validation() {
        assert!(matches!(
            Job::new(None, None, OutputMode::Combined, "out"),
            Err(ConfigError::MissingSeed)
        ));
        assert!(matches!(
            Job::new(Some("  "), None, OutputMode::Combined, "out"),
            Err(ConfigError::MissingSeed)
        ));
        assert!(matches!(
            Job::new(Some("not a url"), None, OutputMode::Combined, "out"),
            Err(ConfigError::InvalidSeed { .. })
        ));
        assert!(matches!(
            Job::new(Some("https://site.test"), Some("(("), OutputMode::Combined, "out"),
            Err(ConfigError::InvalidPattern(_))
        ));

        let job = Job::new(Some("https://site.test/docs"), None, OutputMode::Separate, "out")
            .unwrap();
        assert!(matches!(job.scope, UrlScope::Prefix(ref p) if p == "https://site.test/docs"));

        let job = Job::new(Some(" HTTPS://Site.Test:443 "), None, OutputMode::Combined, "out")
            .unwrap();
        assert_eq!(job.seed, "https://site.test/");
        assert!(matches!(job.scope, UrlScope::Prefix(ref p) if p == "https://site.test/"));
    }
}
