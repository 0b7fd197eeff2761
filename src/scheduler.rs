use crate::crawlers::crawler::PageRenderer;
use crate::error::PageError;
use crate::results::PageRenderResult;
use futures::future::join_all;
use tokio::sync::Semaphore;

/// Renders every URL with at most `max_concurrency` renders in flight.
///
/// All renders are submitted up front and wait on the semaphore for a slot.
/// The i-th result belongs to `urls[i]` whatever order the renders finish in,
/// and a failed page only produces a failed result for itself.
pub async fn render_all<R: PageRenderer>(
    urls: &[String],
    max_concurrency: usize,
    renderer: &R,
) -> Vec<PageRenderResult> {
    let semaphore = Semaphore::new(max_concurrency.max(1));
    let total = urls.len();
    ::log::info!(
        "Rendering {} pages with concurrency {}",
        total,
        max_concurrency
    );

    let tasks = urls.iter().enumerate().map(|(index, url)| {
        let semaphore = &semaphore;
        async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    return PageRenderResult::Failed {
                        url: url.clone(),
                        error: PageError::Session(e.to_string()),
                    };
                }
            };
            ::log::debug!("Rendering [{}/{}]: {}", index + 1, total, url);

            match renderer.render(url).await {
                Ok(pdf) => {
                    ::log::info!(
                        "Rendered [{}/{}]: {} ({} bytes)",
                        index + 1,
                        total,
                        url,
                        pdf.len()
                    );
                    PageRenderResult::Rendered {
                        url: url.clone(),
                        pdf,
                    }
                }
                Err(error) => {
                    ::log::warn!("Render failed for {}: {}", url, error);
                    PageRenderResult::Failed {
                        url: url.clone(),
                        error,
                    }
                }
            }
        }
    });

    join_all(tasks).await
}
