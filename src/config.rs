use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Paper sizes the PDF capture can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
}

/// Configuration for the browser and render stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum number of pages rendered at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Upper bound for loading a page, including the network-idle wait
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Upper bound for the PDF capture itself
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,

    /// How long lazy-loaded content gets to settle after scrolling
    #[serde(default = "default_settle_timeout_secs")]
    pub settle_timeout_secs: u64,

    /// Quiet window that counts as network idle
    #[serde(default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default = "default_device_scale_factor")]
    pub device_scale_factor: f64,

    #[serde(default)]
    pub paper: PaperSize,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Wait for images and request high quality image scaling before capture
    #[serde(default)]
    pub quality: bool,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_render_timeout_secs() -> u64 {
    60
}

fn default_settle_timeout_secs() -> u64 {
    10
}

fn default_network_idle_ms() -> u64 {
    500
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_device_scale_factor() -> f64 {
    2.0
}

fn default_headless() -> bool {
    true
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            max_concurrency: default_max_concurrency(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            render_timeout_secs: default_render_timeout_secs(),
            settle_timeout_secs: default_settle_timeout_secs(),
            network_idle_ms: default_network_idle_ms(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            device_scale_factor: default_device_scale_factor(),
            paper: PaperSize::default(),
            headless: default_headless(),
            quality: false,
        }
    }
}

impl ConvertConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the `WEBDRIVER_URL` environment variable, if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }
}
