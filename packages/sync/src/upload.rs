//! File transfer with percentage progress.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use s3_backup_models::ObjectKey;

use crate::BackupError;
use crate::progress::ProgressCallback;
use crate::store::ObjectStore;

/// Uploads `input_path` to `key` and returns the stored object's location.
///
/// The store reports bytes; `progress` receives whole percentages in
/// `0..=100`. Progress is advisory and never changes the result.
///
/// # Errors
///
/// Returns [`BackupError::Upload`] naming `input_path` if the transfer
/// fails. The upload is attempted once.
pub async fn upload_file<S: ObjectStore + ?Sized>(
    store: &S,
    input_path: &str,
    key: &ObjectKey,
    progress: Arc<dyn ProgressCallback>,
) -> Result<String, BackupError> {
    log::info!("Uploading {input_path} -> {key}");

    let percent = Arc::new(PercentProgress::new(progress.clone()));
    match store.upload(Path::new(input_path), key, percent).await {
        Ok(location) => {
            progress.finish(format!("uploaded {key}"));
            log::info!("file available at {location}");
            Ok(location)
        }
        Err(source) => {
            progress.finish_and_clear();
            log::error!("unable to upload {input_path}: {source}");
            Err(BackupError::Upload {
                path: input_path.to_string(),
                source,
            })
        }
    }
}

/// `round(done / total * 100)`, clamped to `0..=100`.
///
/// An empty file counts as fully transferred.
#[must_use]
pub fn transfer_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = u128::from(done.min(total));
    let total = u128::from(total);
    let rounded = (done * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(100)
}

/// Converts byte counts from a store into percentages for the caller.
struct PercentProgress {
    inner: Arc<dyn ProgressCallback>,
    total: AtomicU64,
    done: AtomicU64,
    last_percent: AtomicU64,
}

impl PercentProgress {
    fn new(inner: Arc<dyn ProgressCallback>) -> Self {
        Self {
            inner,
            total: AtomicU64::new(0),
            done: AtomicU64::new(0),
            last_percent: AtomicU64::new(u64::MAX),
        }
    }

    fn report(&self, done: u64) {
        let percent = u64::from(transfer_percent(done, self.total.load(Ordering::Relaxed)));
        if self.last_percent.swap(percent, Ordering::Relaxed) != percent {
            log::debug!("progress: {percent}%");
            self.inner.set_position(percent);
        }
    }
}

impl ProgressCallback for PercentProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        self.last_percent.store(u64::MAX, Ordering::Relaxed);
        self.inner.set_total(100);
        self.report(0);
    }

    fn set_position(&self, pos: u64) {
        self.done.store(pos, Ordering::Relaxed);
        self.report(pos);
    }

    fn inc(&self, delta: u64) {
        let done = self.done.fetch_add(delta, Ordering::Relaxed) + delta;
        self.report(done);
    }

    fn set_message(&self, msg: String) {
        self.inner.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.inner.finish(msg);
    }

    fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgress;
    use crate::store::mock::{Head, MockStore, Upload};

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(transfer_percent(0, 3), 0);
        assert_eq!(transfer_percent(1, 3), 33);
        assert_eq!(transfer_percent(2, 3), 67);
        assert_eq!(transfer_percent(1, 200), 1);
        assert_eq!(transfer_percent(3, 3), 100);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(transfer_percent(0, 0), 100);
        assert_eq!(transfer_percent(10, 3), 100);
        assert_eq!(transfer_percent(u64::MAX - 1, u64::MAX), 100);
    }

    #[tokio::test]
    async fn completed_upload_reports_percentages() {
        let store = MockStore::new(
            Head::Missing,
            Upload::Complete {
                total: 4,
                chunks: vec![1, 2, 2, 4],
            },
        );
        let progress = Arc::new(RecordingProgress::default());

        let location = upload_file(
            &store,
            "/photos/a.jpg",
            &ObjectKey::new("/photos/a.jpg"),
            progress.clone(),
        )
        .await
        .unwrap();

        assert_eq!(location, "s3://mock/photos/a.jpg");
        assert_eq!(progress.totals.lock().unwrap().as_slice(), [100]);
        // Repeated byte counts do not repeat a percentage.
        assert_eq!(progress.positions.lock().unwrap().as_slice(), [0, 25, 50, 100]);
        assert_eq!(
            progress.finished.lock().unwrap().as_deref(),
            Some("uploaded photos/a.jpg")
        );
    }

    #[tokio::test]
    async fn failed_upload_names_the_input_path() {
        let store = MockStore::new(Head::Missing, Upload::Fail);
        let progress = Arc::new(RecordingProgress::default());

        let err = upload_file(
            &store,
            "/User/brian/hello.jpg",
            &ObjectKey::new(""),
            progress.clone(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BackupError::Upload { .. }));
        assert_eq!(
            err.to_string(),
            "unable to upload /User/brian/hello.jpg due to connection reset by peer"
        );
        assert_eq!(store.upload_count(), 1);
        assert_eq!(progress.finished.lock().unwrap().as_deref(), Some(""));
    }
}
