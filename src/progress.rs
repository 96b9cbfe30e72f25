//! Progress-callback trait for per-page generation events.
//!
//! Inject an `Arc<dyn GenerationProgress>` via
//! [`crate::config::WedcardConfigBuilder::progress`] to receive real-time
//! events as the pipeline works through the page plan.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a broadcast channel, a WebSocket, or a log line
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync`; within one request events arrive strictly in
//! page order because the pipeline itself is sequential, but two
//! concurrent requests sharing one callback will interleave.

use std::sync::Arc;

/// Called by the generation pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only
/// override what they care about.
pub trait GenerationProgress: Send + Sync {
    /// Called once after the text stage, before any page is generated.
    fn on_generation_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page's image-model request is sent.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been generated and stored.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, image_url: &str) {
        let _ = (page_num, total_pages, image_url);
    }

    /// Called when a page fails; the pipeline aborts after this event.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the run, successful or not.
    fn on_generation_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl GenerationProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::WedcardConfig`].
pub type ProgressHandle = Arc<dyn GenerationProgress>;
