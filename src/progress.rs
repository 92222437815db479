//! Progress-callback trait for page-processing events.
//!
//! Inject an [`Arc<dyn ProcessProgressCallback>`] via
//! [`crate::config::BuddyConfigBuilder::progress_callback`] to follow a
//! `process` call as it reads the page, runs each pipeline stage and appends
//! the result blocks.
//!
//! # Example
//!
//! ```rust
//! use notion_research_buddy::{BuddyConfig, ProcessProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl ProcessProgressCallback for StageLogger {
//!     fn on_stage_complete(&self, stage: Stage) {
//!         eprintln!("reached {stage:?}");
//!     }
//! }
//!
//! let config = BuddyConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn ProcessProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::Stage;
use std::sync::Arc;

/// Called while a page is processed.
///
/// All methods default to no-ops so implementations only override what they
/// need. Implementations must be `Send + Sync`: the HTTP surface serves
/// several requests at once and they share one callback.
pub trait ProcessProgressCallback: Send + Sync {
    /// Raw notes were extracted from the page.
    fn on_extracted(&self, page_id: &str, chars: usize) {
        let _ = (page_id, chars);
    }

    /// A pipeline stage is about to call the model.
    ///
    /// `stage` is the state the machine moves to once the call succeeds.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// The machine reached `stage`.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Append call `index` (1-based) of `total` succeeded.
    fn on_block_appended(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// The page was fully processed and written back.
    fn on_process_complete(&self, page_id: &str) {
        let _ = page_id;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BuddyConfig`].
pub type ProgressCallback = Arc<dyn ProcessProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        stages: AtomicUsize,
        appended: AtomicUsize,
    }

    impl ProcessProgressCallback for TrackingCallback {
        fn on_stage_complete(&self, _stage: Stage) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_block_appended(&self, _index: usize, _total: usize) {
            self.appended.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extracted("page", 11);
        cb.on_stage_start(Stage::Refined);
        cb.on_stage_complete(Stage::Refined);
        cb.on_block_appended(1, 5);
        cb.on_process_complete("page");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_stage_complete(Stage::Refined);
        tracker.on_stage_complete(Stage::Diagrammed);
        tracker.on_block_appended(1, 2);
        assert_eq!(tracker.stages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.appended.load(Ordering::SeqCst), 1);
    }
}
