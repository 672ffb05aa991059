//! Skip-or-upload decision.
//!
//! Both digests arrive already normalized: the local one is lower-case hex
//! from [`crate::hash`], the remote one has had its quotes removed by
//! [`crate::remote::lookup`]. Comparison here is plain string equality.

use s3_backup_models::{Decision, FingerprintPair};

use crate::BackupError;

/// Whether the remote copy is identical to the local file.
///
/// An empty remote digest (object missing) never matches.
#[must_use]
pub fn hashes_are_the_same(local_digest: &str, remote_digest: &str) -> bool {
    !remote_digest.is_empty() && local_digest == remote_digest
}

/// Decides what to do with a joined pair of digests.
#[must_use]
pub fn decide(pair: &FingerprintPair) -> Decision {
    if hashes_are_the_same(&pair.local_digest, &pair.remote_digest) {
        Decision::Skip
    } else {
        Decision::Upload
    }
}

/// Joins the hash and lookup results into a [`FingerprintPair`].
///
/// # Errors
///
/// Returns [`BackupError::UnexpectedResultShape`] if the local digest is
/// empty.
pub fn join_fingerprints(
    local_digest: String,
    remote_digest: String,
) -> Result<FingerprintPair, BackupError> {
    FingerprintPair::try_new(local_digest, remote_digest).ok_or_else(|| {
        BackupError::UnexpectedResultShape {
            message: "hash step produced no local MD5".to_string(),
        }
    })
}
