//! HTTP gateway for `GET /screenshot`
//!
//! Parses and defaults the query string, races the capture against the
//! request timeout and maps the outcome onto a response. Capture failures
//! and timeouts are logged here with their detail and reach the caller only
//! as a generic 500.

use crate::{metrics, CaptureRequest, Capturer, Config, GatewayError, OutputSize, ScreenSize};
use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    capturer: Arc<dyn Capturer>,
    request_timeout: Duration,
    default_screen: ScreenSize,
}

impl AppState {
    pub fn new(capturer: Arc<dyn Capturer>, config: &Config) -> Self {
        Self {
            capturer,
            request_timeout: config.request_timeout,
            default_screen: config.screen,
        }
    }
}

/// Raw query parameters, kept as text so malformed numbers fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default)]
pub struct ScreenshotQuery {
    pub url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub output_width: Option<String>,
    pub output_height: Option<String>,
    pub full_screen: Option<String>,
}

impl ScreenshotQuery {
    /// Read a query string without ever rejecting it.
    ///
    /// Unknown keys are ignored, invalid percent-encoding is decoded lossily
    /// and the first occurrence of a repeated key wins.
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::default();

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let slot = match &*key {
                "url" => &mut query.url,
                "width" => &mut query.width,
                "height" => &mut query.height,
                "outputWidth" => &mut query.output_width,
                "outputHeight" => &mut query.output_height,
                "fullScreen" => &mut query.full_screen,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        query
    }

    pub fn into_capture_request(self, defaults: ScreenSize) -> Result<CaptureRequest, GatewayError> {
        let url = match self.url {
            Some(url) if !url.is_empty() => url,
            _ => return Err(GatewayError::MissingUrl),
        };

        let screen = ScreenSize {
            width: parse_dimension(self.width.as_deref()).unwrap_or(defaults.width),
            height: parse_dimension(self.height.as_deref()).unwrap_or(defaults.height),
        };

        let output = OutputSize {
            width: parse_dimension(self.output_width.as_deref()).unwrap_or(screen.width),
            height: parse_dimension(self.output_height.as_deref()).unwrap_or(screen.height),
        };

        Ok(CaptureRequest {
            output,
            full_page: self.full_screen.as_deref() == Some("true"),
            ..CaptureRequest::new(url, screen)
        })
    }
}

/// Read a positive integer from the leading digits of `raw`.
///
/// Leading whitespace and a `+` sign are skipped and trailing junk is
/// ignored, so `"800px"` reads as 800. Zero, negatives, overflow and values
/// without leading digits yield `None`.
pub fn parse_dimension(raw: Option<&str>) -> Option<u32> {
    let trimmed = raw?.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    match unsigned[..digits_end].parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/screenshot", get(screenshot))
        .layer(cors)
        .with_state(state)
}

async fn screenshot(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, GatewayError> {
    let query = ScreenshotQuery::parse(raw.as_deref().unwrap_or_default());
    let request = match query.into_capture_request(state.default_screen) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected screenshot request: {}", e);
            metrics::record_request(e.kind());
            return Err(e);
        }
    };

    let id = request.id;
    let url = request.url.clone();
    info!(
        "Request {} for {} (screen {}x{}, output {}x{}, full page: {})",
        id,
        url,
        request.screen.width,
        request.screen.height,
        request.output.width,
        request.output.height,
        request.full_page
    );

    match capture_with_deadline(state.capturer.as_ref(), request, state.request_timeout).await {
        Ok(png) => {
            metrics::record_request("success");
            Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
        }
        Err(e) => {
            error!("Error capturing screenshot for request {} ({}): {}", id, url, e);
            metrics::record_request(e.kind());
            Err(e)
        }
    }
}

/// Race `capturer` against a timer of `limit`.
///
/// The first to finish decides the outcome. When the timer wins, the
/// capture future is dropped, which tears down any browser session it
/// still owns.
pub async fn capture_with_deadline(
    capturer: &dyn Capturer,
    request: CaptureRequest,
    limit: Duration,
) -> Result<Vec<u8>, GatewayError> {
    tokio::select! {
        result = capturer.capture(request) => result.map_err(GatewayError::from),
        _ = tokio::time::sleep(limit) => Err(GatewayError::Timeout(limit)),
    }
}
