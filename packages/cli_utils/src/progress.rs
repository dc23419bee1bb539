//! Progress reporting for CSV imports.
//!
//! Library code reports through [`ProgressCallback`] and never touches a
//! terminal; binaries plug in [`crate::IndicatifProgress`] and tests plug in
//! [`NullProgress`].

use std::sync::Arc;

/// Receives row counts from an import.
pub trait ProgressCallback: Send + Sync {
    /// Marks `delta` more rows as processed.
    fn inc(&self, delta: u64);

    /// Ends the import with a summary line.
    fn finish(&self, msg: String);
}

/// A no-op [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
