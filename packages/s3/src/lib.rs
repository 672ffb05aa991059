#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Amazon S3 backend for s3-backup.
//!
//! Implements [`ObjectStore`] with `HeadObject` for the `ETag` lookup and a
//! single streaming `PutObject` for the transfer. The request body reads
//! the file in fixed-size chunks and reports bytes sent, so large files are
//! never held in memory.
//!
//! The SDK URI-encodes object keys itself, so requests are built from
//! [`ObjectKey::as_str`]. That addresses the same object as the
//! [`ObjectKey::encoded`] form.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `AWS_ACCESS_KEY_ID` | Yes | Access key |
//! | `AWS_SECRET_ACCESS_KEY` | Yes | Secret key |
//! | `AWS_REGION` | No | Bucket region (default `us-east-1`) |
//! | `AWS_ENDPOINT_URL` | No | S3-compatible endpoint; enables path-style addressing |

mod body;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, StalledStreamProtectionConfig};
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::body::SdkBody;
use s3_backup_models::ObjectKey;
use s3_backup_sync::progress::ProgressCallback;
use s3_backup_sync::{BackupError, HeadResponse, ObjectStore, StoreError};

use crate::body::ProgressBody;

/// Environment variable holding the access key.
pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable holding the secret key.
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";

/// Region used when `AWS_REGION` is unset.
const DEFAULT_REGION: &str = "us-east-1";

/// Errors that can occur while configuring the S3 store.
#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },
}

impl From<S3Error> for BackupError {
    fn from(err: S3Error) -> Self {
        log::debug!("{err}");
        Self::Configuration {
            message: format!(
                "Missing AWS credentials. You need two environment variables \
                 defined: {ACCESS_KEY_VAR} and {SECRET_KEY_VAR}"
            ),
        }
    }
}

/// Connection settings for an [`S3Store`].
#[derive(Clone)]
pub struct S3Settings {
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Bucket region.
    pub region: String,
    /// S3-compatible endpoint; `None` for AWS itself.
    pub endpoint: Option<String>,
}

impl S3Settings {
    /// Reads the settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`S3Error::MissingEnv`] if either credential variable is
    /// unset or empty.
    pub fn from_env() -> Result<Self, S3Error> {
        Ok(Self {
            access_key: require_env(ACCESS_KEY_VAR)?,
            secret_key: require_env(SECRET_KEY_VAR)?,
            region: optional_env("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: optional_env("AWS_ENDPOINT_URL"),
        })
    }
}

/// [`ObjectStore`] backed by one S3 bucket.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Creates a store for `bucket` from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`S3Error::MissingEnv`] if either credential variable is
    /// unset or empty.
    pub fn from_env(bucket: &str) -> Result<Self, S3Error> {
        Ok(Self::new(bucket, &S3Settings::from_env()?))
    }

    /// Creates a store for `bucket` with explicit settings.
    ///
    /// Each request is attempted once; the SDK's retry policy is disabled.
    #[must_use]
    pub fn new(bucket: &str, settings: &S3Settings) -> Self {
        let creds = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "s3-backup-env",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(settings.region.clone()))
            .credentials_provider(creds)
            .retry_config(RetryConfig::disabled())
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled());

        if let Some(endpoint) = &settings.endpoint {
            log::debug!("using custom S3 endpoint {endpoint}");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
        }
    }

    /// Name of the bucket this store writes to.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head(&self, key: &ObjectKey) -> Result<HeadResponse, StoreError> {
        log::debug!("HEAD s3://{}/{key}", self.bucket);

        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await;

        match result {
            Ok(output) => Ok(HeadResponse {
                status: 200,
                etag: output.e_tag().map(str::to_string),
            }),
            Err(err) => {
                // Any HTTP answer, 404 included, is a response rather than a failure.
                if let Some(raw) = err.raw_response() {
                    let status = raw.status().as_u16();
                    if err
                        .as_service_error()
                        .is_some_and(aws_sdk_s3::operation::head_object::HeadObjectError::is_not_found)
                    {
                        log::debug!("  s3://{}/{key} not found", self.bucket);
                    }
                    return Ok(HeadResponse { status, etag: None });
                }
                Err(StoreError::Transport {
                    source: Box::new(err),
                })
            }
        }
    }

    async fn upload(
        &self,
        local_path: &Path,
        key: &ObjectKey,
        progress: Arc<dyn ProgressCallback>,
    ) -> Result<String, StoreError> {
        let file = tokio::fs::File::open(local_path).await?;
        let size = file.metadata().await?.len();
        let content_length = i64::try_from(size).map_err(std::io::Error::other)?;

        #[allow(clippy::cast_precision_loss)] // display-only MB value
        let mb = size as f64 / 1_048_576.0;
        log::info!(
            "Pushing {} -> s3://{}/{key} ({mb:.1} MB)",
            local_path.display(),
            self.bucket
        );

        progress.set_total(size);
        let body = ByteStream::new(SdkBody::from_body_1_x(ProgressBody::new(
            file, size, progress,
        )));

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_length(content_length)
            .content_type("application/octet-stream")
            .body(body)
            .send()
            .await;

        match result {
            Ok(_) => Ok(object_url(&self.bucket, key)),
            Err(err) => {
                let status = err.raw_response().map(|raw| raw.status().as_u16());
                Err(match status {
                    Some(status) => StoreError::Rejected {
                        status,
                        source: Box::new(err),
                    },
                    None => StoreError::Transport {
                        source: Box::new(err),
                    },
                })
            }
        }
    }
}

/// `s3://bucket/key` locator for a stored object.
#[must_use]
pub fn object_url(bucket: &str, key: &ObjectKey) -> String {
    format!("s3://{bucket}/{key}")
}

/// Reads a required, non-empty environment variable.
fn require_env(name: &str) -> Result<String, S3Error> {
    optional_env(name).ok_or_else(|| S3Error::MissingEnv {
        name: name.to_string(),
    })
}

/// Reads an optional environment variable, treating empty as unset.
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
