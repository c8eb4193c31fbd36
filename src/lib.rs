//! # Screenshot Server
//!
//! An HTTP service that renders a URL in headless Chrome, captures a PNG,
//! resizes it and returns the bytes. One endpoint, no persistent state.
//!
//! ## Request Flow
//!
//! 1. `GET /screenshot` is parsed and defaulted by the [`gateway`].
//! 2. The gateway races a [`Capturer`] against the request timeout.
//! 3. [`ChromeCapturer`] launches a dedicated Chrome, sizes the viewport,
//!    navigates and waits for the network to go idle, then screenshots the
//!    viewport or the full page.
//! 4. The browser is torn down and the image is cover-fitted to the output
//!    size, anchored to the top edge.
//!
//! Every request gets its own browser process. Nothing is pooled or reused,
//! and a request that times out still has its Chrome killed.
//!
//! ## Query Parameters
//!
//! | Parameter | Default | Notes |
//! |-----------|---------|-------|
//! | `url` | required | `400 {"error": "Missing URL parameter"}` when absent |
//! | `width` / `height` | 1920 / 1080 | Browser viewport |
//! | `outputWidth` / `outputHeight` | viewport size | Returned image size |
//! | `fullScreen` | `false` | Only the literal `true` enables full-page capture |
//!
//! ## Quick Start
//!
//! ```bash
//! PORT=3000 screenshot-server
//! curl -o shot.png "http://localhost:3000/screenshot?url=https://example.com&outputWidth=400&outputHeight=300"
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use screenshot_server::{router, AppState, ChromeCapturer, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let capturer = Arc::new(ChromeCapturer::new(config.clone()));
//!     let app = router(AppState::new(capturer, &config));
//!
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// Configuration and settings for the screenshot server
pub mod config;

/// Error types and their HTTP mapping
pub mod error;

/// Isolated per-request Chrome sessions
pub mod browser;

/// Navigation with a network idle wait
pub mod navigation;

/// Cover-fit resizing anchored to the top edge
pub mod resize;

/// Capture orchestration for a single request
pub mod capture;

/// HTTP gateway for the screenshot endpoint
pub mod gateway;

/// Command-line interface and startup helpers
pub mod cli;

/// Metrics recorded through the `metrics` facade
pub mod metrics;

/// Utility functions and helpers
pub mod utils;


pub use browser::*;
pub use capture::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use gateway::*;
pub use utils::*;
