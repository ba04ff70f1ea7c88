//! Progress-callback trait for detection and extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator moves through its states. Events for different
//! files may interleave when the batch runner processes files concurrently,
//! so implementations must synchronise any shared mutable state.
//!
//! # Example
//!
//! ```rust
//! use ocr_langdetect::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ExtractionProgressCallback for Counter {
//!     fn on_extraction_complete(&self, file: &str, language: &str, chars: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{file}: {chars} chars of {language}");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::confidence::Tier;
use std::sync::Arc;

/// Called by the orchestrator at each state transition.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before a batch starts.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before the recognition engine is invoked for a file.
    fn on_detection_start(&self, file: &str) {
        let _ = file;
    }

    /// Called after reconciliation, with the primary code (if any) and tier.
    fn on_detection_complete(&self, file: &str, primary: Option<&str>, tier: Tier) {
        let _ = (file, primary, tier);
    }

    /// Called before the extraction engine is invoked.
    fn on_extraction_start(&self, file: &str, language: &str) {
        let _ = (file, language);
    }

    /// Called when text was extracted.
    fn on_extraction_complete(&self, file: &str, language: &str, chars: usize) {
        let _ = (file, language, chars);
    }

    /// Called when a file ends in the failed state.
    fn on_extraction_failed(&self, file: &str, error: &str) {
        let _ = (file, error);
    }

    /// Called once after every file in a batch has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
