//! Captures against a real Chrome. Run with `cargo test -- --ignored` on a
//! machine with Chrome/Chromium installed (set `CHROME_PATH` if it is not
//! on the default search path) and network access.

use image::GenericImageView;
use screenshot_server::{
    capture_with_deadline, CaptureRequest, Capturer, ChromeCapturer, Config, GatewayError,
    OutputSize, ScreenSize,
};
use std::time::Duration;

fn test_config() -> Config {
    Config {
        request_timeout: Duration::from_secs(60),
        navigation_timeout: Duration::from_secs(60),
        chrome_path: std::env::var("CHROME_PATH").ok(),
        ..Default::default()
    }
}

fn profile_dirs() -> usize {
    std::fs::read_dir(std::env::temp_dir())
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| {
                    entry
                        .file_name()
                        .to_string_lossy()
                        .starts_with("screenshot-server-")
                })
                .count()
        })
        .unwrap_or(0)
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium and network access"]
async fn test_viewport_capture_has_screen_dimensions() {
    let capturer = ChromeCapturer::new(test_config());
    let request = CaptureRequest::new("https://example.com", ScreenSize::default());

    let png = capturer.capture(request).await.unwrap();

    let image = image::load_from_memory(&png).unwrap();
    assert_eq!(image.dimensions(), (1920, 1080));
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium and network access"]
async fn test_resized_full_page_capture() {
    let capturer = ChromeCapturer::new(test_config());
    let request = CaptureRequest {
        output: OutputSize {
            width: 400,
            height: 300,
        },
        full_page: true,
        ..CaptureRequest::new(
            "https://example.com",
            ScreenSize {
                width: 800,
                height: 600,
            },
        )
    };

    let png = capturer.capture(request).await.unwrap();

    let image = image::load_from_memory(&png).unwrap();
    assert_eq!(image.dimensions(), (400, 300));
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium"]
async fn test_unreachable_host_leaves_no_profile_behind() {
    let before = profile_dirs();
    let capturer = ChromeCapturer::new(test_config());
    let request = CaptureRequest::new("http://127.0.0.1:9/", ScreenSize::default());

    // Chrome may render its own error page here, so only cleanup is checked.
    let _ = capturer.capture(request).await;
    assert_eq!(profile_dirs(), before);
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium"]
async fn test_timeout_kills_the_browser() {
    let before = profile_dirs();
    let capturer = ChromeCapturer::new(test_config());
    // Never answers, so navigation hangs until the outer deadline fires.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _stall = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let request = CaptureRequest::new(format!("http://{addr}/"), ScreenSize::default());
    let result = capture_with_deadline(&capturer, request, Duration::from_secs(5)).await;
    assert!(matches!(result, Err(GatewayError::Timeout(_))));

    // The kill runs on a background task spawned from Drop.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(profile_dirs(), before);
}
