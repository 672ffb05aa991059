#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value types shared by the s3-backup pipeline.
//!
//! A local path is resolved once into a [`PathMapping`]. The output key of
//! that mapping becomes an [`ObjectKey`], which is the single address used
//! for both the metadata lookup and the upload. The concurrent hash and
//! lookup results are joined into a [`FingerprintPair`], from which a
//! [`Decision`] is made.

use std::path::MAIN_SEPARATOR;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use strum_macros::{AsRefStr, Display};

/// Characters left unescaped by URL component encoding.
///
/// Matches the unreserved set `A-Z a-z 0-9 - _ . ! ~ * ' ( )`; everything
/// else, including `/` and space, is percent-encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Local input path and the remote key derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    /// Path of the local file, exactly as given by the caller.
    pub input_path: String,
    /// Remote key, still carrying its leading separator (if any).
    pub output_key: String,
}

impl PathMapping {
    /// The object key addressed by this mapping.
    #[must_use]
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(&self.output_key)
    }
}

/// Address of a remote object within its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    key: String,
}

impl ObjectKey {
    /// Builds a key from an output path, dropping one leading separator.
    #[must_use]
    pub fn new(output_key: &str) -> Self {
        Self {
            key: strip_leading_separator(output_key).to_string(),
        }
    }

    /// Logical key, without the leading separator and without encoding.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// URL-encoded form of the key, as placed on the wire.
    #[must_use]
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.key, COMPONENT).to_string()
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// Encodes a local-style path for remote addressing.
///
/// Drops exactly one leading path separator, then percent-encodes the rest
/// as a URL component (`"/abc def"` becomes `"abc%20def"`).
#[must_use]
pub fn encode_key(path: &str) -> String {
    ObjectKey::new(path).encoded()
}

fn strip_leading_separator(path: &str) -> &str {
    path.strip_prefix(MAIN_SEPARATOR).unwrap_or(path)
}

/// Local and remote digests joined after the concurrent hash/lookup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintPair {
    /// Lower-case hex MD5 of the local file.
    pub local_digest: String,
    /// Normalized remote `ETag`; empty when the object does not exist.
    pub remote_digest: String,
}

impl FingerprintPair {
    /// Joins the two digests.
    ///
    /// Returns `None` when the local digest is empty, since an empty local
    /// fingerprint means the hash step never produced a result.
    #[must_use]
    pub fn try_new(local_digest: String, remote_digest: String) -> Option<Self> {
        if local_digest.is_empty() {
            return None;
        }
        Some(Self {
            local_digest,
            remote_digest,
        })
    }

    /// Whether the remote object was reported at all.
    #[must_use]
    pub const fn remote_exists(&self) -> bool {
        !self.remote_digest.is_empty()
    }
}

/// What to do with the local file once both digests are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
    /// Remote content is identical; nothing to transfer.
    Skip,
    /// Remote content is missing or different.
    Upload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sep(path: &str) -> String {
        path.replace('/', &MAIN_SEPARATOR.to_string())
    }

    #[test]
    fn encode_key_escapes_spaces() {
        assert_eq!(encode_key("abc def"), "abc%20def");
    }

    #[test]
    fn encode_key_strips_one_leading_separator() {
        assert_eq!(encode_key(&sep("/abc def")), "abc%20def");
        assert_eq!(encode_key(&sep("/abc def")), encode_key("abc def"));
    }

    #[test]
    fn encode_key_escapes_separators_inside_the_key() {
        assert_eq!(encode_key("a/b c.jpg"), "a%2Fb%20c.jpg");
    }

    #[test]
    fn encode_key_keeps_component_unreserved_set() {
        assert_eq!(encode_key("A-z_0.9!~*'()"), "A-z_0.9!~*'()");
        assert_eq!(encode_key("a+b&c=d"), "a%2Bb%26c%3Dd");
    }

    #[test]
    fn object_key_exposes_logical_and_encoded_forms() {
        let key = ObjectKey::new(&sep("/Pictures/my photo.jpg"));
        assert_eq!(key.as_str(), sep("Pictures/my photo.jpg"));
        assert_eq!(key.encoded(), encode_key(&sep("/Pictures/my photo.jpg")));
    }

    #[test]
    fn fingerprint_pair_requires_local_digest() {
        assert!(FingerprintPair::try_new(String::new(), "abc".to_string()).is_none());

        let pair = FingerprintPair::try_new("abc".to_string(), String::new()).unwrap();
        assert!(!pair.remote_exists());
    }

    #[test]
    fn decision_display() {
        assert_eq!(Decision::Skip.to_string(), "skip");
        assert_eq!(Decision::Upload.as_ref(), "upload");
    }
}
