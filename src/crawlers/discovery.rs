use crate::crawlers::crawler::LinkSource;
use crate::filter::UrlScope;
use crate::results::CrawlReport;
use crate::utils::normalize_url;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Breadth-first discovery of every in-scope page reachable from `seed`.
///
/// The queue and visited set live in this call frame only, so pages are
/// fetched one at a time. Each normalized URL is fetched at most once, which
/// makes the crawl terminate on cyclic link graphs. A page that fails to load
/// contributes no links but stays in the report.
pub async fn crawl<S: LinkSource>(seed: &str, scope: &UrlScope, source: &S) -> CrawlReport {
    ::log::info!("Starting crawl from: {}", seed);

    let seed = match Url::parse(seed) {
        Ok(parsed) => normalize_url(parsed.as_str()),
        Err(_) => normalize_url(seed),
    };
    let mut report = CrawlReport::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queued: HashSet<String> = HashSet::from([seed.clone()]);
    let mut pending: VecDeque<String> = VecDeque::from([seed]);

    while let Some(url) = pending.pop_front() {
        if !visited.insert(url.clone()) {
            ::log::trace!("Skipping already visited: {}", url);
            continue;
        }
        report.pages.push(url.clone());

        let page = match source.fetch_links(&url).await {
            Ok(page) => page,
            Err(e) => {
                ::log::warn!("Crawl fetch failed for {}: {}", url, e);
                report.fetch_failures.push((url, e));
                continue;
            }
        };

        let base = match Url::parse(&page.location).or_else(|_| Url::parse(&url)) {
            Ok(base) => base,
            Err(e) => {
                ::log::warn!("Cannot resolve links on {}: {}", url, e);
                continue;
            }
        };

        let mut added = 0;
        for href in &page.links {
            let Some(absolute) = scope.accept(&base, href) else {
                continue;
            };
            let normalized = normalize_url(&absolute);
            if visited.contains(&normalized) || !queued.insert(normalized.clone()) {
                continue;
            }
            ::log::debug!("Queuing link for crawling: {}", normalized);
            pending.push_back(normalized);
            added += 1;
        }
        ::log::info!(
            "Found {} links on {}, {} new",
            page.links.len(),
            url,
            added
        );
    }

    ::log::info!(
        "Crawl complete: {} pages, {} fetch failures",
        report.pages.len(),
        report.fetch_failures.len()
    );
    report
}
