use crate::config::{ConvertConfig, PaperSize};
use crate::crawlers::crawler::{FetchedPage, LinkSource, PageRenderer};
use crate::error::{BrowserError, PageError};
use crate::parsers::{self, html};
use fantoccini::error::CmdError;
use fantoccini::wd::{PrintConfiguration, PrintSize, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use url::Url;

/// Interval between DOM checks while waiting for a page to go quiet
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between scroll-height samples while lazy content settles
const SETTLE_INTERVAL: Duration = Duration::from_millis(250);

const LOAD_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

const SCROLL_TO_BOTTOM_SCRIPT: &str =
    "window.scrollTo(0, document.body ? document.body.scrollHeight : 0);";

const SCROLL_HEIGHT_SCRIPT: &str = "return document.body ? document.body.scrollHeight : 0;";

const IMAGES_COMPLETE_SCRIPT: &str =
    "return Array.from(document.images).every(img => img.complete);";

const HIGH_QUALITY_IMAGES_SCRIPT: &str = r#"
const style = document.createElement('style');
style.textContent = 'img { image-rendering: high-quality; image-rendering: -webkit-optimize-contrast; }';
document.head.appendChild(style);
"#;

/// Local WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: [&str; 2] = [
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Outcome of waiting for lazy-loaded content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Stabilized,
    TimedOut,
}

/// A WebDriver-backed browser.
///
/// Holds one long-lived session used for link discovery. Every render opens
/// its own session, since a WebDriver session drives a single window at a
/// time, and closes it before returning.
pub struct Browser {
    client: Client,
    webdriver_url: String,
    config: ConvertConfig,
}

impl Browser {
    /// Connects the shared crawl session
    pub async fn open(config: &ConvertConfig) -> Result<Self, BrowserError> {
        ::log::info!("Connecting to WebDriver at {}", config.webdriver_url);
        let (client, webdriver_url) = connect_with_fallback(config).await?;
        ::log::debug!("Crawl session connected to {}", webdriver_url);

        Ok(Self {
            client,
            webdriver_url,
            config: config.clone(),
        })
    }

    /// Closes the shared crawl session
    pub async fn close(self) {
        match self.client.close().await {
            Ok(()) => ::log::debug!("Closed crawl session"),
            Err(e) => ::log::warn!("Failed to close crawl session: {}", e),
        }
    }

    async fn open_page_session(&self) -> Result<Client, PageError> {
        connect(&self.webdriver_url, &self.config)
            .await
            .map_err(|e| PageError::Session(e.to_string()))
    }
}

impl LinkSource for Browser {
    async fn fetch_links(&self, url: &str) -> Result<FetchedPage, PageError> {
        if !parsers::should_extract_links(url) {
            ::log::debug!("Not parsing links from non-HTML resource: {}", url);
            return Ok(FetchedPage {
                location: url.to_string(),
                links: Vec::new(),
            });
        }

        navigate(&self.client, url, &self.config).await?;

        let source = self.client.source().await.map_err(navigation_error)?;
        let location = match self.client.current_url().await {
            Ok(current) => current.to_string(),
            Err(e) => {
                ::log::debug!("Could not read location of {}: {}", url, e);
                url.to_string()
            }
        };

        Ok(FetchedPage {
            location: effective_base(&location, html::parse_base_href(&source).as_deref()),
            links: html::parse_links(&source),
        })
    }
}

impl PageRenderer for Browser {
    async fn render(&self, url: &str) -> Result<Vec<u8>, PageError> {
        let client = self.open_page_session().await?;
        let outcome = capture(&client, url, &self.config).await;

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close render session for {}: {}", url, e);
        }
        outcome
    }
}

/// Navigates and waits for network idle, all within the navigation timeout
async fn navigate(client: &Client, url: &str, config: &ConvertConfig) -> Result<(), PageError> {
    let limit = config.navigation_timeout();
    let load = async {
        client.goto(url).await.map_err(navigation_error)?;
        wait_for_network_idle(client, config.network_idle()).await;
        Ok::<(), PageError>(())
    };

    match timeout(limit, load).await {
        Ok(result) => result,
        Err(_) => Err(PageError::NavigationTimeout(limit)),
    }
}

/// Loads, settles and prints a single page
async fn capture(client: &Client, url: &str, config: &ConvertConfig) -> Result<Vec<u8>, PageError> {
    ::log::debug!("Capturing: {}", url);
    let started = Instant::now();

    navigate(client, url, config).await?;

    if settle(client, config.settle_timeout()).await == Settle::TimedOut {
        ::log::debug!("Content of {} still growing after settle window", url);
    }

    if let Err(e) = client
        .set_window_size(config.window_width, config.window_height)
        .await
    {
        ::log::debug!("Could not resize window for {}: {}", url, e);
    }

    if config.quality {
        prepare_images(client, config.settle_timeout()).await;
    }

    let print = print_configuration(config.paper)?;
    let limit = config.render_timeout();
    let pdf = match timeout(limit, client.print(print)).await {
        Ok(Ok(pdf)) => pdf,
        Ok(Err(e)) => return Err(PageError::Render(e.to_string())),
        Err(_) => return Err(PageError::RenderTimeout(limit)),
    };

    ::log::debug!(
        "Captured {} in {:.2} seconds",
        url,
        started.elapsed().as_secs_f64()
    );
    Ok(pdf)
}

/// Polls until the document is complete and no new resources have started
/// for `quiet`. Only the caller's timeout ends an endless busy page.
async fn wait_for_network_idle(client: &Client, quiet: Duration) {
    let mut last: Option<(String, u64)> = None;
    let mut quiet_since = Instant::now();

    loop {
        let state = match client.execute(LOAD_STATE_SCRIPT, Vec::new()).await {
            Ok(value) => load_state(&value),
            Err(e) => {
                ::log::trace!("Load state check failed: {}", e);
                None
            }
        };

        if state != last {
            last = state;
            quiet_since = Instant::now();
        } else if matches!(&last, Some((ready, _)) if ready == "complete")
            && quiet_since.elapsed() >= quiet
        {
            return;
        }
        sleep(POLL_INTERVAL).await;
    }
}

fn load_state(value: &Value) -> Option<(String, u64)> {
    let items = value.as_array()?;
    let ready = items.first()?.as_str()?.to_string();
    let resources = items.get(1)?.as_u64()?;
    Some((ready, resources))
}

/// Scrolls to trigger lazy content and waits for the page height to stop
/// changing. Never fails; a page that keeps growing just times out.
async fn settle(client: &Client, window: Duration) -> Settle {
    let deadline = Instant::now() + window;
    let mut last = scroll_to_bottom(client).await;

    let outcome = loop {
        if Instant::now() >= deadline {
            break Settle::TimedOut;
        }
        sleep(SETTLE_INTERVAL).await;

        let height = scroll_to_bottom(client).await;
        if heights_agree(last, height) {
            break Settle::Stabilized;
        }
        last = height;
    };

    let _ = client.execute("window.scrollTo(0, 0);", Vec::new()).await;
    outcome
}

/// Two height samples agree only when both scrolls reported a height
fn heights_agree(previous: Option<u64>, current: Option<u64>) -> bool {
    matches!((previous, current), (Some(a), Some(b)) if a == b)
}

async fn scroll_to_bottom(client: &Client) -> Option<u64> {
    let _ = client.execute(SCROLL_TO_BOTTOM_SCRIPT, Vec::new()).await;
    client
        .execute(SCROLL_HEIGHT_SCRIPT, Vec::new())
        .await
        .ok()
        .and_then(|v| v.as_u64())
}

/// Waits (bounded) for images to finish loading, then asks for smooth scaling
async fn prepare_images(client: &Client, window: Duration) {
    let deadline = Instant::now() + window;
    loop {
        let complete = client
            .execute(IMAGES_COMPLETE_SCRIPT, Vec::new())
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if complete || Instant::now() >= deadline {
            break;
        }
        sleep(POLL_INTERVAL).await;
    }

    if let Err(e) = client.execute(HIGH_QUALITY_IMAGES_SCRIPT, Vec::new()).await {
        ::log::debug!("Could not inject image styles: {}", e);
    }
}

/// Print settings: fixed paper, backgrounds on, content shrunk to fit
fn print_configuration(paper: PaperSize) -> Result<PrintConfiguration, PageError> {
    PrintConfiguration::builder()
        .size(print_size(paper))
        .background(true)
        .shrink_to_fit(true)
        .build()
        .map_err(|e| PageError::Render(format!("invalid print configuration: {e:?}")))
}

fn print_size(paper: PaperSize) -> PrintSize {
    match paper {
        PaperSize::A4 => PrintSize::A4,
        PaperSize::Letter => PrintSize::US_LETTER,
        PaperSize::Legal => PrintSize::US_LEGAL,
    }
}

/// Links resolve against `<base href>` when the page declares one
fn effective_base(location: &str, base_href: Option<&str>) -> String {
    let Some(href) = base_href else {
        return location.to_string();
    };
    Url::parse(location)
        .and_then(|loc| loc.join(href))
        .map(String::from)
        .unwrap_or_else(|_| location.to_string())
}

fn navigation_error(error: CmdError) -> PageError {
    PageError::Navigation(error.to_string())
}

/// Session capabilities: fixed window, high device scale factor, headless
fn capabilities(config: &ConvertConfig) -> Map<String, Value> {
    let mut chrome_args = vec![
        format!("--window-size={},{}", config.window_width, config.window_height),
        format!("--force-device-scale-factor={}", config.device_scale_factor),
        "--hide-scrollbars".to_string(),
    ];
    let mut firefox_args = Vec::new();
    if config.headless {
        chrome_args.push("--headless=new".to_string());
        chrome_args.push("--disable-gpu".to_string());
        firefox_args.push("-headless".to_string());
    }

    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": firefox_args,
            "prefs": { "layout.css.devPixelsPerPx": config.device_scale_factor.to_string() },
        }),
    );
    caps
}

async fn connect(webdriver_url: &str, config: &ConvertConfig) -> Result<Client, String> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities(config));
    let client = builder
        .connect(webdriver_url)
        .await
        .map_err(|e| e.to_string())?;

    let timeouts = TimeoutConfiguration::new(
        Some(config.navigation_timeout()),
        Some(config.navigation_timeout()),
        None,
    );
    if let Err(e) = client.update_timeouts(timeouts).await {
        ::log::debug!("Could not set WebDriver timeouts: {}", e);
    }
    Ok(client)
}

/// Connects to the configured WebDriver, then to common local endpoints
async fn connect_with_fallback(config: &ConvertConfig) -> Result<(Client, String), BrowserError> {
    let first_error = match connect(&config.webdriver_url, config).await {
        Ok(client) => return Ok((client, config.webdriver_url.clone())),
        Err(e) => e,
    };
    ::log::warn!(
        "Failed to connect to WebDriver at {}: {}",
        config.webdriver_url,
        first_error
    );

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == config.webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = connect(url, config).await {
            return Ok((client, url.to_string()));
        }
    }

    Err(BrowserError {
        url: config.webdriver_url.clone(),
        reason: first_error,
    })
}
