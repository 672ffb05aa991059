//! Sequencing of the backup steps.
//!
//! ```text
//! Resolving -> { Hashing || RemoteLookup } -> Deciding -> [Uploading] -> Done | Failed
//! ```
//!
//! Hashing and the remote lookup are the only steps that overlap. Each
//! step hands its result to the next by value; the first failure ends the
//! run.

use std::sync::Arc;

use s3_backup_models::{Decision, FingerprintPair, PathMapping};
use strum_macros::AsRefStr;

use crate::progress::ProgressCallback;
use crate::store::ObjectStore;
use crate::{BackupError, decision, hash, path, remote, upload};

/// What to back up and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    /// Local file to back up.
    pub local_path: String,
    /// Leading directories to drop from the remote key.
    pub strip_count: Option<usize>,
    /// Prefix placed verbatim in front of the remote key.
    pub prepend: Option<String>,
}

/// Terminal result of one backup run.
#[derive(Debug, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum UploadOutcome {
    /// The remote copy was already identical.
    Skipped,
    /// The file was transferred.
    Uploaded {
        /// Where the object now lives.
        location: String,
    },
    /// A step failed; nothing after it ran.
    Failed(BackupError),
}

impl UploadOutcome {
    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Skipped | Self::Uploaded { .. } => 0,
            Self::Failed(_) => 1,
        }
    }

    /// Operator-facing summary line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Skipped => "...skipping, already uploaded.".to_string(),
            Self::Uploaded { .. } => "...uploaded successfully.".to_string(),
            Self::Failed(e) => format!("error: {e}"),
        }
    }

    /// Whether the run failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Result<UploadOutcome, BackupError>> for UploadOutcome {
    fn from(result: Result<UploadOutcome, BackupError>) -> Self {
        result.unwrap_or_else(Self::Failed)
    }
}

/// Runs the whole pipeline for one file.
///
/// Always returns exactly one outcome; failures are folded into
/// [`UploadOutcome::Failed`].
pub async fn run<S: ObjectStore + ?Sized>(
    store: &S,
    request: &BackupRequest,
    progress: Arc<dyn ProgressCallback>,
) -> UploadOutcome {
    let outcome = UploadOutcome::from(try_run(store, request, progress).await);
    log::debug!("state: done ({})", outcome.as_ref());
    outcome
}

async fn try_run<S: ObjectStore + ?Sized>(
    store: &S,
    request: &BackupRequest,
    progress: Arc<dyn ProgressCallback>,
) -> Result<UploadOutcome, BackupError> {
    log::debug!("state: resolving {}", request.local_path);
    let mapping = path::resolve(
        &request.local_path,
        request.strip_count,
        request.prepend.as_deref(),
    );
    let key = mapping.object_key();

    log::debug!(
        "state: hashing {} while looking up {}",
        mapping.input_path,
        key.encoded()
    );
    let (local_digest, remote_digest) = tokio::try_join!(
        hash::hash_file(&mapping.input_path),
        remote::lookup(store, &key),
    )?;

    let pair = decision::join_fingerprints(local_digest, remote_digest)?;
    upload_if_changed(store, &mapping, &pair, progress).await
}

/// Skips or uploads, given digests that are already known.
///
/// Never returns [`UploadOutcome::Failed`]; failures come back as `Err`.
///
/// # Errors
///
/// Returns [`BackupError::Upload`] if the transfer fails.
pub async fn upload_if_changed<S: ObjectStore + ?Sized>(
    store: &S,
    mapping: &PathMapping,
    pair: &FingerprintPair,
    progress: Arc<dyn ProgressCallback>,
) -> Result<UploadOutcome, BackupError> {
    let decision = decision::decide(pair);
    log::debug!(
        "state: deciding (local {}, remote {:?}) -> {decision}",
        pair.local_digest,
        pair.remote_digest
    );

    match decision {
        Decision::Skip => {
            log::info!("{} already on remote, skipping", mapping.input_path);
            Ok(UploadOutcome::Skipped)
        }
        Decision::Upload => {
            if pair.remote_exists() {
                log::debug!("state: uploading (remote copy differs)");
            } else {
                log::debug!("state: uploading (no remote copy)");
            }
            let key = mapping.object_key();
            let location = upload::upload_file(store, &mapping.input_path, &key, progress).await?;
            Ok(UploadOutcome::Uploaded { location })
        }
    }
}
