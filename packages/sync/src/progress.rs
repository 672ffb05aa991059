//! Progress reporting trait for uploads.
//!
//! Defines a [`ProgressCallback`] trait that decouples progress reporting
//! from any specific rendering backend (e.g., `indicatif` progress bars,
//! log-only reporting, or silence). Implementations are provided upstream
//! in crates that choose a rendering strategy.

use std::sync::Arc;

/// Trait for reporting progress from long-running operations.
///
/// Implementations must be `Send + Sync` to support use inside request
/// bodies polled by the HTTP client and `Arc`-based sharing.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Set the current position (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark progress as complete and remove the progress indicator.
    fn finish_and_clear(&self);
}

/// A no-op implementation of [`ProgressCallback`] that silently ignores
/// all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Records every position it is given, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub totals: std::sync::Mutex<Vec<u64>>,
    pub positions: std::sync::Mutex<Vec<u64>>,
    pub finished: std::sync::Mutex<Option<String>>,
}

#[cfg(test)]
impl ProgressCallback for RecordingProgress {
    fn set_total(&self, total: u64) {
        self.totals.lock().unwrap().push(total);
    }

    fn set_position(&self, pos: u64) {
        self.positions.lock().unwrap().push(pos);
    }

    fn inc(&self, delta: u64) {
        let mut positions = self.positions.lock().unwrap();
        let last = positions.last().copied().unwrap_or(0);
        positions.push(last + delta);
    }

    fn set_message(&self, _msg: String) {}

    fn finish(&self, msg: String) {
        *self.finished.lock().unwrap() = Some(msg);
    }

    fn finish_and_clear(&self) {
        *self.finished.lock().unwrap() = Some(String::new());
    }
}
