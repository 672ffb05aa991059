//! Remote `ETag` lookup.

use s3_backup_models::ObjectKey;

use crate::BackupError;
use crate::store::ObjectStore;

/// Fetches the normalized `ETag` of `key`.
///
/// Returns an empty string when the object does not exist or the response
/// carries no `ETag`. Only a missing response is an error.
///
/// # Errors
///
/// Returns [`BackupError::RemoteLookup`] if the request could not be
/// completed (usually no network).
pub async fn lookup<S: ObjectStore + ?Sized>(store: &S, key: &ObjectKey) -> Result<String, BackupError> {
    let response = store
        .head(key)
        .await
        .map_err(|source| BackupError::RemoteLookup {
            key: key.to_string(),
            source,
        })?;

    if !response.is_success() && !response.is_not_found() {
        log::warn!(
            "HEAD {} answered HTTP {}; treating the object as absent",
            key.encoded(),
            response.status
        );
    }

    let etag = response
        .etag
        .as_deref()
        .map(normalize_etag)
        .unwrap_or_default()
        .to_string();

    if etag.is_empty() {
        log::debug!("no remote ETag for {key}");
    } else {
        log::debug!("remote ETag of {key}: {etag}");
    }
    Ok(etag)
}

/// Strips the pair of double quotes S3 wraps around `ETag` values.
///
/// A value without both quotes is returned unchanged.
#[must_use]
pub fn normalize_etag(etag: &str) -> &str {
    etag.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(etag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{Head, MockStore, Upload};

    fn store(head: Head) -> MockStore {
        MockStore::new(head, Upload::Fail)
    }

    #[tokio::test]
    async fn returns_unquoted_etag() {
        let store = store(Head::Etag("6363f0d465541022f9b743c2f745b493"));
        let etag = lookup(&store, &ObjectKey::new("photo.jpg")).await.unwrap();
        assert_eq!(etag, "6363f0d465541022f9b743c2f745b493");
    }

    #[tokio::test]
    async fn strips_wrapping_quotes() {
        let store = store(Head::Etag("\"6363f0d465541022f9b743c2f745b493\""));
        let etag = lookup(&store, &ObjectKey::new("photo.jpg")).await.unwrap();
        assert_eq!(etag, "6363f0d465541022f9b743c2f745b493");
    }

    #[tokio::test]
    async fn missing_object_yields_empty_digest() {
        let store = store(Head::Missing);
        let etag = lookup(&store, &ObjectKey::new("photo.jpg")).await.unwrap();
        assert_eq!(etag, "");
    }

    #[tokio::test]
    async fn empty_etag_header_yields_empty_digest() {
        let store = store(Head::Etag(""));
        let etag = lookup(&store, &ObjectKey::new("photo.jpg")).await.unwrap();
        assert_eq!(etag, "");
    }

    #[tokio::test]
    async fn error_status_is_not_a_failure() {
        let store = store(Head::Status(403));
        let etag = lookup(&store, &ObjectKey::new("photo.jpg")).await.unwrap();
        assert_eq!(etag, "");
    }

    #[tokio::test]
    async fn transport_failure_suggests_connectivity() {
        let store = store(Head::Transport);
        let err = lookup(&store, &ObjectKey::new("photo.jpg")).await.unwrap_err();
        assert!(matches!(err, BackupError::RemoteLookup { .. }));
        assert!(err.to_string().contains("Not connected to the internet?"));
    }

    #[tokio::test]
    async fn requests_the_encoded_key() {
        let store = store(Head::Missing);
        let key = ObjectKey::new(&format!("{}my photos/a b.jpg", std::path::MAIN_SEPARATOR));
        lookup(&store, &key).await.unwrap();
        assert_eq!(store.heads.lock().unwrap().as_slice(), [key.encoded()]);
    }

    #[test]
    fn normalize_leaves_bare_etag_alone() {
        assert_eq!(normalize_etag("abc"), "abc");
        assert_eq!(normalize_etag("\"abc\""), "abc");
    }

    #[test]
    fn normalize_only_removes_a_wrapping_pair() {
        assert_eq!(normalize_etag("\"abc"), "\"abc");
        assert_eq!(normalize_etag("abc\""), "abc\"");
        assert_eq!(normalize_etag("\"\"abc\"\""), "\"abc\"");
        assert_eq!(normalize_etag("\""), "\"");
    }
}
