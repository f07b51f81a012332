//! Progress-callback trait for per-record probe events.
//!
//! Inject an [`Arc<dyn DepictProgressCallback>`] via
//! [`crate::config::DepictConfigBuilder::progress_callback`] to receive events
//! as the image probe works through a render pass.
//!
//! # Example
//!
//! ```rust
//! use depict_board::{DepictProgressCallback, DepictConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl DepictProgressCallback for FailureCounter {
//!     fn on_record_error(&self, position: usize, _total: usize, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("record {position}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(FailureCounter { failed: AtomicUsize::new(0) });
//! let config = DepictConfig::builder()
//!     .progress_callback(counter as Arc<dyn DepictProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the image probe as it processes each record.
///
/// Probes run concurrently, so per-record methods may be called from several
/// tasks at once and in any order. All methods default to no-ops.
pub trait DepictProgressCallback: Send + Sync {
    /// Called once before any record is probed.
    fn on_probe_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a record's image is requested.
    fn on_record_start(&self, position: usize, total: usize) {
        let _ = (position, total);
    }

    /// Called when a record's image loaded.
    fn on_record_loaded(&self, position: usize, total: usize, bytes: usize) {
        let _ = (position, total, bytes);
    }

    /// Called when a record's image failed; `error` is the message shown
    /// in its place.
    fn on_record_error(&self, position: usize, total: usize, error: &str) {
        let _ = (position, total, error);
    }

    /// Called once after every record was attempted.
    fn on_probe_complete(&self, total: usize, loaded: usize) {
        let _ = (total, loaded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DepictProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DepictConfig`].
pub type ProgressCallback = Arc<dyn DepictProgressCallback>;
