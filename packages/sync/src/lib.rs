#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Idempotent single-file upload pipeline.
//!
//! A local file is uploaded only when its MD5 differs from the `ETag` of
//! the object already stored under the derived key:
//!
//! 1. [`path::resolve`] maps the local path to a remote key.
//! 2. [`hash::hash_file`] and [`remote::lookup`] run concurrently.
//! 3. [`decision::decide`] compares the two digests.
//! 4. [`upload::upload_file`] transfers the file when they differ.
//!
//! [`pipeline::run`] sequences the steps and always produces exactly one
//! [`pipeline::UploadOutcome`].
//!
//! The object store itself sits behind the [`store::ObjectStore`] trait so
//! the pipeline can be driven by the S3 client or by an in-memory double.

pub mod decision;
pub mod hash;
pub mod path;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod store;
pub mod upload;

pub use pipeline::{BackupRequest, UploadOutcome};
pub use store::{HeadResponse, ObjectStore, StoreError};

/// Errors that end a backup run.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Missing credentials or required arguments, detected before the
    /// pipeline starts.
    #[error("{message}")]
    Configuration {
        /// What is missing and how to fix it.
        message: String,
    },

    /// The local file could not be read while hashing.
    #[error("Unable to read {path}: {source}")]
    Stream {
        /// Local path being hashed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The metadata request never received a response.
    #[error(
        "When checking remote file's ETag for {key}, this error occurred: {source}. \
         Not connected to the internet?"
    )]
    RemoteLookup {
        /// Object key being looked up.
        key: String,
        /// Underlying store error.
        source: StoreError,
    },

    /// The transfer failed.
    #[error("unable to upload {path} due to {source}")]
    Upload {
        /// Local path being uploaded.
        path: String,
        /// Underlying store error.
        source: StoreError,
    },

    /// A pipeline step produced something other than what the next step
    /// expects.
    #[error("Results not expected: {message}")]
    UnexpectedResultShape {
        /// Which result was malformed.
        message: String,
    },
}
