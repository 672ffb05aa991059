//! The object store seam.
//!
//! The pipeline never talks to S3 directly. It needs exactly two things
//! from a store: a metadata-only request and a whole-file upload. Both are
//! single futures that settle once with a `Result`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use s3_backup_models::ObjectKey;

use crate::progress::ProgressCallback;

/// Errors reported by an [`ObjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No response was received (DNS, connect, TLS, timeout).
    #[error("{source}")]
    Transport {
        /// Underlying client error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered but refused the request.
    #[error("server responded with HTTP {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Underlying client error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The local file could not be read during the transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Response to a metadata-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    /// HTTP status code of the response.
    pub status: u16,
    /// Raw `ETag` header, as sent on the wire (usually quoted).
    pub etag: Option<String>,
}

impl HeadResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Whether the server reported the object as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// A remote object store holding the backup copies.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issues a metadata-only request for `key`.
    ///
    /// Any HTTP response, including 404, is `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if no response was received.
    async fn head(&self, key: &ObjectKey) -> Result<HeadResponse, StoreError>;

    /// Uploads the file at `local_path` to `key`.
    ///
    /// Reports bytes through `progress`: `set_total` with the file size,
    /// then `set_position` with bytes sent so far. Returns a locator for
    /// the stored object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or the transfer
    /// fails. Implementations must not retry.
    async fn upload(
        &self,
        local_path: &Path,
        key: &ObjectKey,
        progress: Arc<dyn ProgressCallback>,
    ) -> Result<String, StoreError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use s3_backup_models::ObjectKey;

    use super::{HeadResponse, ObjectStore, StoreError};
    use crate::progress::ProgressCallback;

    /// Scripted answer to `head`.
    pub enum Head {
        Etag(&'static str),
        Missing,
        Status(u16),
        Transport,
    }

    /// Scripted behavior of `upload`.
    pub enum Upload {
        Complete { total: u64, chunks: Vec<u64> },
        Fail,
    }

    /// In-memory store that records the keys it is asked about.
    pub struct MockStore {
        head: Head,
        upload: Upload,
        pub heads: Mutex<Vec<String>>,
        pub uploads: Mutex<Vec<(PathBuf, String)>>,
    }

    impl MockStore {
        pub const fn new(head: Head, upload: Upload) -> Self {
            Self {
                head,
                upload,
                heads: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
            }
        }

        pub fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        async fn head(&self, key: &ObjectKey) -> Result<HeadResponse, StoreError> {
            self.heads.lock().unwrap().push(key.encoded());
            match &self.head {
                Head::Etag(etag) => Ok(HeadResponse {
                    status: 200,
                    etag: Some((*etag).to_string()),
                }),
                Head::Missing => Ok(HeadResponse {
                    status: 404,
                    etag: None,
                }),
                Head::Status(status) => Ok(HeadResponse {
                    status: *status,
                    etag: None,
                }),
                Head::Transport => Err(StoreError::Transport {
                    source: "getaddrinfo ENOTFOUND bucket.s3.amazonaws.com".into(),
                }),
            }
        }

        async fn upload(
            &self,
            local_path: &Path,
            key: &ObjectKey,
            progress: Arc<dyn ProgressCallback>,
        ) -> Result<String, StoreError> {
            self.uploads
                .lock()
                .unwrap()
                .push((local_path.to_path_buf(), key.encoded()));
            match &self.upload {
                Upload::Complete { total, chunks } => {
                    progress.set_total(*total);
                    for sent in chunks {
                        progress.set_position(*sent);
                    }
                    Ok(format!("s3://mock/{key}"))
                }
                Upload::Fail => Err(StoreError::Transport {
                    source: "connection reset by peer".into(),
                }),
            }
        }
    }
}
