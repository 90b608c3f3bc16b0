//! Live preview: a watermarked first page, recomputed through a debounce queue
//!
//! Rapid edits to the watermark settings each submit a preview request. The
//! [`Debouncer`] keeps at most one pending request: a newer submission
//! replaces the pending one, and the request only runs once submissions have
//! been quiet for the debounce window. A request that is already running is
//! never interrupted; a newer result simply overwrites it afterwards.

use std::future::Future;
use std::time::Duration;
use lopdf::Document;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;
use crate::error::Result;
use crate::pdf::stamp::{save_document, stamp_document, WatermarkOptions};

/// Quiet period before a preview request runs
pub const PREVIEW_DEBOUNCE: Duration = Duration::from_millis(500);

/// Render a one-page preview PDF from the first page of `bytes`
///
/// Blank watermark text shows the page as it is.
pub fn render_preview(bytes: &[u8], options: &WatermarkOptions) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes)?;

    let page_count = doc.get_pages().len() as u32;
    if page_count > 1 {
        let rest: Vec<u32> = (2..=page_count).collect();
        doc.delete_pages(&rest);
        doc.prune_objects();
    }

    stamp_document(&mut doc, options)?;
    save_document(&mut doc, options)
}

/// Depth-1 request queue where newer requests supersede pending ones
///
/// Requests live in a single `watch` slot, so a burst of submissions never
/// holds more than the latest one.
pub struct Debouncer<T> {
    sender: watch::Sender<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Start the worker task. `handler` runs for each request that survives
    /// the debounce window.
    ///
    /// Dropping the debouncer flushes any pending request and then stops the
    /// worker; await the returned handle to wait for that.
    pub fn spawn<F, Fut>(delay: Duration, mut handler: F) -> (Self, JoinHandle<()>)
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, mut receiver) = watch::channel::<Option<T>>(None);

        let worker = tokio::spawn(async move {
            // Yields a pending request even after the sender is gone
            while receiver.changed().await.is_ok() {
                let mut closed = false;

                // The quiet window restarts whenever a newer request lands
                loop {
                    match timeout(delay, receiver.changed()).await {
                        Ok(Ok(())) => debug!("preview request superseded"),
                        Ok(Err(_)) => {
                            closed = true;
                            break;
                        }
                        Err(_) => break,
                    }
                }

                let latest = receiver.borrow_and_update().clone();
                if let Some(request) = latest {
                    handler(request).await;
                }

                if closed {
                    break;
                }
            }
        });

        (Self { sender }, worker)
    }

    /// Replace the pending request
    ///
    /// Returns false if the worker has stopped.
    pub fn submit(&self, request: T) -> bool {
        self.sender.send(Some(request)).is_ok()
    }
}
