//! Capture orchestration
//!
//! `ChromeCapturer` runs the whole pipeline for one request: launch an
//! isolated browser, size the viewport, navigate and wait for the network to
//! settle, take the screenshot, tear the browser down and resize the image.

use crate::navigation::goto_network_idle;
use crate::{
    metrics, resize, validate_url, BrowserSession, CaptureError, Config, OutputSize, ScreenSize,
};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Fully validated parameters for one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Correlates log lines for one HTTP request
    pub id: Uuid,
    pub url: String,
    pub screen: ScreenSize,
    pub output: OutputSize,
    /// Capture the whole scrollable page instead of the viewport
    pub full_page: bool,
}

impl CaptureRequest {
    pub fn new(url: impl Into<String>, screen: ScreenSize) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            screen,
            output: screen.into(),
            full_page: false,
        }
    }
}

/// Produces PNG bytes for a capture request.
///
/// The gateway only depends on this trait, so it can be driven without a
/// real browser.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, CaptureError>;
}

/// Captures pages with a dedicated headless Chrome per request.
///
/// # Examples
///
/// ```rust,no_run
/// use screenshot_server::{CaptureRequest, Capturer, ChromeCapturer, Config, ScreenSize};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let capturer = ChromeCapturer::new(Config::default());
///     let request = CaptureRequest::new("https://example.com", ScreenSize::default());
///     let png = capturer.capture(request).await?;
///     println!("Captured {} bytes", png.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ChromeCapturer {
    config: Arc<Config>,
}

impl ChromeCapturer {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    async fn screenshot(
        &self,
        session: &BrowserSession,
        request: &CaptureRequest,
    ) -> Result<Vec<u8>, CaptureError> {
        let page = session.new_page().await?;

        set_viewport(&page, request.screen).await?;

        goto_network_idle(
            &page,
            &request.url,
            self.config.network_idle,
            self.config.navigation_timeout,
        )
        .await?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(request.full_page)
            .build();

        page.screenshot(params)
            .await
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))
    }
}

#[async_trait]
impl Capturer for ChromeCapturer {
    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, CaptureError> {
        let start_time = Instant::now();

        validate_url(&request.url)
            .map_err(|e| CaptureError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        let limits = self.config.resize_limits();
        limits.check(request.screen.width, request.screen.height)?;
        limits.check(request.output.width, request.output.height)?;

        let session = BrowserSession::launch(&self.config, request.screen).await?;
        debug!(
            "Request {} using browser session {}",
            request.id,
            session.id()
        );

        let screenshot = self.screenshot(&session, &request).await;
        // Release the browser before the CPU-bound resize.
        session.close().await;
        let raw = screenshot?;

        let output = request.output;
        let limits = self.config.resize_limits();
        let raw_len = raw.len();
        let png = tokio::task::spawn_blocking(move || resize::cover_top(&raw, output, limits))
            .await
            .map_err(|e| CaptureError::ImageProcessing(e.to_string()))??;

        let duration = start_time.elapsed();
        metrics::record_capture(duration);
        info!(
            "Request {} captured {} ({} -> {}) in {}",
            request.id,
            request.url,
            crate::format_bytes(raw_len),
            crate::format_bytes(png.len()),
            crate::format_duration(duration)
        );

        Ok(png)
    }
}

/// Emulate a `screen` sized viewport at a 1:1 pixel ratio so the captured
/// image has exactly the requested pixel dimensions.
async fn set_viewport(page: &Page, screen: ScreenSize) -> Result<(), CaptureError> {
    let emulation_params = SetDeviceMetricsOverrideParams::builder()
        .width(screen.width)
        .height(screen.height)
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(CaptureError::PageError)?;

    page.execute(emulation_params)
        .await
        .map_err(|e| CaptureError::PageError(e.to_string()))?;

    Ok(())
}
