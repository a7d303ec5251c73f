//! Progress-callback trait for upload events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::ValidatorConfigBuilder::progress_callback`] to receive
//! events as the candidate is streamed to the validation backend.
//!
//! Every event carries the upload's generation token. A host that starts a
//! second upload before the first resolves can tell the two apart and drop
//! whatever arrives late from the superseded one.
//!
//! # Example
//!
//! ```rust
//! use thesis_check::{UploadProgressCallback, ValidatorConfig};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl UploadProgressCallback for LastPercent {
//!     fn on_progress(&self, _generation: u64, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ValidatorConfig::builder()
//!     .progress_callback(Arc::new(LastPercent(AtomicU8::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the transfer client while an upload is in flight.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once, before the first byte is sent.
    fn on_upload_start(&self, generation: u64, file_name: &str, total_bytes: u64) {
        let _ = (generation, file_name, total_bytes);
    }

    /// Called with the rounded percentage of the body sent so far.
    ///
    /// Within one generation the values never decrease and never repeat.
    fn on_progress(&self, generation: u64, percent: u8) {
        let _ = (generation, percent);
    }

    /// Called once when the backend answered and the body was normalised.
    fn on_upload_complete(&self, generation: u64, error_count: usize) {
        let _ = (generation, error_count);
    }

    /// Called once when the upload or normalisation failed.
    fn on_upload_failed(&self, generation: u64, error: &str) {
        let _ = (generation, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ValidatorConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;

/// Turns byte counts into the percentages an upload reports.
///
/// `round(sent / total × 100)`, clamped to 100, emitted only when it moves
/// forward. An empty body counts as fully sent.
#[derive(Debug, Clone)]
pub struct PercentTracker {
    total: u64,
    sent: u64,
    last: Option<u8>,
}

impl PercentTracker {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            sent: 0,
            last: None,
        }
    }

    /// Record `n` more bytes sent; returns the new percentage if it advanced.
    pub fn advance(&mut self, n: u64) -> Option<u8> {
        self.sent = self.sent.saturating_add(n);
        let pct = percent_of(self.sent, self.total);
        self.emit(pct)
    }

    /// Force 100. Returns `None` if 100 was already emitted.
    pub fn finish(&mut self) -> Option<u8> {
        self.emit(100)
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    fn emit(&mut self, pct: u8) -> Option<u8> {
        match self.last {
            Some(prev) if pct <= prev => None,
            _ => {
                self.last = Some(pct);
                Some(pct)
            }
        }
    }
}

/// `round(sent / total × 100)` in integer arithmetic, clamped to 100.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total) as u128;
    let total = total as u128;
    ((sent * 200 + total) / (total * 2)) as u8
}
