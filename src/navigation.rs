//! Navigation that waits for the network to settle
//!
//! Chrome's load event fires long before late XHRs, fonts and lazy images
//! finish. A page counts as idle once no request has been in flight for the
//! configured settle window.

use crate::CaptureError;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Requests seen on the wire that have not finished or failed yet.
#[derive(Debug, Default)]
pub struct InflightRequests {
    pending: HashSet<String>,
    seen: usize,
}

impl InflightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&mut self, request_id: &str) {
        if self.pending.insert(request_id.to_string()) {
            self.seen += 1;
        }
    }

    /// Finished and failed requests are treated the same. Unknown ids are
    /// ignored (requests issued before the listeners were attached).
    pub fn settled(&mut self, request_id: &str) {
        self.pending.remove(request_id);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn seen(&self) -> usize {
        self.seen
    }
}

/// Navigate `page` to `url` and wait until the network has been idle for
/// `idle_window`. Both phases share the `limit` budget.
pub async fn goto_network_idle(
    page: &Page,
    url: &str,
    idle_window: Duration,
    limit: Duration,
) -> Result<(), CaptureError> {
    match timeout(limit, navigate(page, url, idle_window)).await {
        Ok(result) => result,
        Err(_) => Err(CaptureError::NavigationTimeout(limit)),
    }
}

async fn navigate(page: &Page, url: &str, idle_window: Duration) -> Result<(), CaptureError> {
    // Listeners go in before navigation so no request escapes the count.
    let mut sent = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|e| CaptureError::PageError(e.to_string()))?;
    let mut finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(|e| CaptureError::PageError(e.to_string()))?;
    let mut failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(|e| CaptureError::PageError(e.to_string()))?;

    page.goto(url)
        .await
        .map_err(|e| CaptureError::NavigationFailed(e.to_string()))?;

    let mut inflight = InflightRequests::new();
    loop {
        tokio::select! {
            // Drain starts before completions so a request is never
            // settled ahead of being seen.
            biased;
            Some(event) = sent.next() => inflight.started(event.request_id.inner()),
            Some(event) = finished.next() => inflight.settled(event.request_id.inner()),
            Some(event) = failed.next() => inflight.settled(event.request_id.inner()),
            _ = sleep(idle_window), if inflight.is_idle() => break,
            // Streams closed and requests still pending: the page is gone.
            else => {
                return Err(CaptureError::NavigationFailed(
                    "page closed while waiting for network idle".to_string(),
                ))
            }
        }
    }

    debug!(
        "Network idle for {} after {} requests",
        url,
        inflight.seen()
    );
    Ok(())
}
