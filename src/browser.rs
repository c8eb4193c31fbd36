//! One Chrome process per capture
//!
//! A `BrowserSession` owns a freshly launched Chrome, the task polling its
//! DevTools connection and the throwaway profile directory it runs in.
//! Sessions are never pooled or shared: the capture that launched one closes
//! it, and a session dropped without `close` (the owning future was
//! cancelled) kills its process from `Drop`. The profile directory is a
//! `TempDir`, so it is removed on every path, including a launch that is
//! cancelled before the session exists.

use crate::{create_browser_config, metrics, CaptureError, Config, ScreenSize};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Instant;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

const PROFILE_PREFIX: &str = "screenshot-server-";

pub struct BrowserSession {
    id: Uuid,
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile: Option<TempDir>,
    launched_at: Instant,
}

impl BrowserSession {
    pub async fn launch(config: &Config, screen: ScreenSize) -> Result<Self, CaptureError> {
        let id = Uuid::new_v4();
        let profile = create_profile(config).map_err(|e| {
            CaptureError::BrowserLaunchFailed(format!("Failed to create profile dir: {e}"))
        })?;

        let browser_config = create_browser_config(config, screen, profile.path())
            .map_err(CaptureError::BrowserLaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CaptureError::BrowserLaunchFailed(e.to_string()))?;

        // The handler implements Stream and must be polled for the CDP
        // connection to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        metrics::session_opened();
        debug!(
            "Browser session {} launched in {}",
            id,
            profile.path().display()
        );

        Ok(Self {
            id,
            browser: Some(browser),
            handler,
            profile: Some(profile),
            launched_at: Instant::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn new_page(&self) -> Result<Page, CaptureError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| CaptureError::PageError("browser session already closed".to_string()))?;

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))
    }

    /// Shut Chrome down and wait for the process to exit.
    ///
    /// Falls back to killing the process when the graceful close command
    /// fails (e.g. the DevTools connection is already gone).
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser session {} did not close cleanly: {}", self.id, e);
                let _ = browser.kill().await;
            }
            if let Err(e) = browser.wait().await {
                warn!("Browser session {} exit status unavailable: {}", self.id, e);
            }
        }

        self.handler.abort();
        if let Some(profile) = self.profile.take() {
            remove_profile(profile).await;
        }
        debug!(
            "Browser session {} closed after {:?}",
            self.id,
            self.launched_at.elapsed()
        );
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        metrics::session_closed();
        self.handler.abort();

        let browser = self.browser.take();
        let profile = self.profile.take();
        if browser.is_none() && profile.is_none() {
            return;
        }

        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Some(mut browser) = browser {
                        let _ = browser.kill().await;
                    }
                    if let Some(profile) = profile {
                        remove_profile(profile).await;
                    }
                    debug!("Browser session {} cleaned up after cancellation", id);
                });
            }
            Err(_) => {
                // chromiumoxide spawns Chrome with kill_on_drop and the
                // TempDir removes itself.
                warn!("Browser session {} dropped outside the runtime", id);
                drop(browser);
                drop(profile);
            }
        }
    }
}

fn create_profile(config: &Config) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(PROFILE_PREFIX);

    match &config.profile_root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            builder.tempdir_in(root)
        }
        None => builder.tempdir(),
    }
}

async fn remove_profile(profile: TempDir) {
    let path = profile.path().to_path_buf();
    match tokio::task::spawn_blocking(move || profile.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Ok(Err(e)) => warn!("Failed to remove profile dir {}: {}", path.display(), e),
        Err(e) => warn!("Profile cleanup task for {} failed: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|dir| dir.count()).unwrap_or(0)
    }

    fn config_in(root: &Path, chrome_path: &Path) -> Config {
        Config {
            profile_root: Some(root.to_path_buf()),
            chrome_path: Some(chrome_path.display().to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_profile_is_created_under_root() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            profile_root: Some(root.path().join("profiles")),
            ..Default::default()
        };

        let profile = create_profile(&config).unwrap();

        assert!(profile.path().starts_with(root.path().join("profiles")));
        assert!(profile
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(PROFILE_PREFIX));

        drop(profile);
        assert_eq!(entries(&root.path().join("profiles")), 0);
    }

    #[tokio::test]
    async fn test_failed_launch_removes_profile() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path(), Path::new("/nonexistent/chrome"));

        let result = BrowserSession::launch(&config, ScreenSize::default()).await;

        assert!(matches!(result, Err(CaptureError::BrowserLaunchFailed(_))));
        assert_eq!(entries(root.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_launch_removes_profile() {
        use std::os::unix::fs::PermissionsExt;

        // Stands in for a Chrome that never reports its DevTools endpoint.
        let bin = tempfile::tempdir().unwrap();
        let chrome = bin.path().join("chrome");
        std::fs::write(&chrome, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&chrome, std::fs::Permissions::from_mode(0o755)).unwrap();

        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path(), &chrome);

        let launch = BrowserSession::launch(&config, ScreenSize::default());
        let result = tokio::time::timeout(Duration::from_millis(300), launch).await;

        assert!(result.is_err());
        assert_eq!(entries(root.path()), 0);
    }
}
