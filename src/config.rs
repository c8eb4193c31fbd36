//! Configuration management with serde serialization/deserialization
//!
//! Holds the process-wide settings read once at startup (listening port,
//! timeouts, default screen size, Chrome launch options) and the helpers
//! that turn them into a chromiumoxide `BrowserConfig`.

use crate::{CaptureError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-request bound: three minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Largest accepted viewport or output side, matching Chrome's texture cap.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

/// Largest image, in pixels, the resize step will decode or produce.
pub const DEFAULT_MAX_PIXELS: u64 = 64 * 1024 * 1024;

/// Main configuration structure for the screenshot server
///
/// Built once in `main` and shared read-only afterwards.
///
/// # Examples
///
/// ```rust
/// use screenshot_server::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     port: 8080,
///     request_timeout: Duration::from_secs(60),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// TCP port the HTTP gateway listens on (default: 3000)
    pub port: u16,

    /// Upper bound for one capture attempt, raced against the capture (default: 3 minutes)
    pub request_timeout: Duration,

    /// Bound for navigation plus the network idle wait (default: 3 minutes)
    ///
    /// Shares its default with `request_timeout`. The outer race still
    /// covers hangs that happen outside navigation.
    pub navigation_timeout: Duration,

    /// How long the page must go without in-flight requests to count as idle (default: 500ms)
    pub network_idle: Duration,

    /// Screen size used when a request does not specify one
    pub screen: ScreenSize,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent string for page loads (default: Chrome default)
    pub user_agent: Option<String>,

    /// Extra command-line flags appended to the Chrome launch arguments
    pub chrome_args: Vec<String>,

    /// Directory that holds the per-session Chrome profiles (default: system temp dir)
    pub profile_root: Option<PathBuf>,

    /// Port for the Prometheus exporter; metrics stay in-process when unset
    pub metrics_port: Option<u16>,

    /// Upper bound for any requested width or height (default: 16384)
    pub max_dimension: u32,

    /// Upper bound for the pixel count of any image held in memory (default: 64Mi)
    pub max_pixels: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            request_timeout: DEFAULT_TIMEOUT,
            navigation_timeout: DEFAULT_TIMEOUT,
            network_idle: Duration::from_millis(500),
            screen: ScreenSize::default(),
            chrome_path: None,
            user_agent: None,
            chrome_args: Vec::new(),
            profile_root: None,
            metrics_port: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if self.navigation_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "navigation timeout must be greater than 0".to_string(),
            ));
        }

        if self.network_idle >= self.navigation_timeout {
            return Err(ConfigError::Invalid(
                "network idle window must be shorter than the navigation timeout".to_string(),
            ));
        }

        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::Invalid(
                "screen dimensions must be greater than 0".to_string(),
            ));
        }

        if self.max_dimension == 0 || self.max_pixels == 0 {
            return Err(ConfigError::Invalid(
                "image size limits must be greater than 0".to_string(),
            ));
        }

        if let Err(e) = self.resize_limits().check(self.screen.width, self.screen.height) {
            return Err(ConfigError::Invalid(format!("default screen: {e}")));
        }

        if self.metrics_port.is_some() && self.metrics_port == Some(self.port) {
            return Err(ConfigError::Invalid(format!(
                "metrics port {} collides with the server port",
                self.port
            )));
        }

        Ok(())
    }

    pub fn resize_limits(&self) -> ResizeLimits {
        ResizeLimits {
            max_dimension: self.max_dimension,
            max_pixels: self.max_pixels,
        }
    }
}

/// Size bounds applied to requested dimensions and to every image the
/// resize step decodes or allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeLimits {
    pub max_dimension: u32,
    pub max_pixels: u64,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl ResizeLimits {
    /// Reject a `width` x `height` box that exceeds either bound.
    pub fn check(&self, width: u32, height: u32) -> Result<(), CaptureError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(CaptureError::ImageProcessing(format!(
                "{width}x{height} exceeds the {} pixel side limit",
                self.max_dimension
            )));
        }

        if u64::from(width) * u64::from(height) > self.max_pixels {
            return Err(CaptureError::ImageProcessing(format!(
                "{width}x{height} exceeds the {} pixel area limit",
                self.max_pixels
            )));
        }

        Ok(())
    }
}

/// Browser viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScreenSize {
    /// Viewport width in pixels (default: 1920)
    pub width: u32,

    /// Viewport height in pixels (default: 1080)
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Dimensions of the PNG handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl From<ScreenSize> for OutputSize {
    fn from(screen: ScreenSize) -> Self {
        Self {
            width: screen.width,
            height: screen.height,
        }
    }
}

/// Generate Chrome command-line arguments for one isolated session
///
/// Every session gets its own profile directory so concurrent Chrome
/// processes never contend for the same singleton lock.
///
/// # Examples
///
/// ```rust
/// use screenshot_server::{chrome_args, Config, ScreenSize};
/// use std::path::{Path, PathBuf};
///
/// let config = Config::default();
/// let args = chrome_args(&config, ScreenSize::default(), Path::new("/tmp/profile"));
/// assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
/// ```
pub fn chrome_args(config: &Config, screen: ScreenSize, profile_dir: &Path) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-features=TranslateUI".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        format!("--window-size={},{}", screen.width, screen.height),
        format!("--user-data-dir={}", profile_dir.display()),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args.extend(config.chrome_args.iter().cloned());

    args
}

/// Build the chromiumoxide launch configuration for one session
///
/// The default 800x600 viewport emulation is switched off; the page's
/// device metrics are set explicitly once the page exists.
pub fn create_browser_config(
    config: &Config,
    screen: ScreenSize,
    profile_dir: &Path,
) -> Result<chromiumoxide::browser::BrowserConfig, String> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .window_size(screen.width, screen.height)
        .viewport(None)
        .request_timeout(config.navigation_timeout)
        .args(chrome_args(config, screen, profile_dir));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build()
}
