use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

pub const MISSING_URL_MESSAGE: &str = "Missing URL parameter";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Anything that can go wrong between launching Chrome and encoding the PNG.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Page error: {0}")]
    PageError(String),

    #[error("URL loading failed: {0}")]
    NavigationFailed(String),

    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}

impl CaptureError {
    /// Short stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::InvalidUrl(_) => "invalid_url",
            CaptureError::BrowserLaunchFailed(_) => "browser_launch",
            CaptureError::PageError(_) => "page",
            CaptureError::NavigationFailed(_) => "navigation",
            CaptureError::NavigationTimeout(_) => "navigation_timeout",
            CaptureError::CaptureFailed(_) => "capture",
            CaptureError::ImageProcessing(_) => "image",
        }
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::ImageProcessing(err.to_string())
    }
}

/// Outcome of a `/screenshot` request that did not produce an image.
///
/// The response body never carries the underlying error; callers get one of
/// two fixed messages and the detail stays in the server log.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing url parameter")]
    MissingUrl,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingUrl => StatusCode::BAD_REQUEST,
            GatewayError::Capture(_) | GatewayError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MissingUrl => "missing_url",
            GatewayError::Capture(err) => err.kind(),
            GatewayError::Timeout(_) => "timeout",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = match self {
            GatewayError::MissingUrl => MISSING_URL_MESSAGE,
            GatewayError::Capture(_) | GatewayError::Timeout(_) => INTERNAL_ERROR_MESSAGE,
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}
