#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Object store abstraction for wheelhouse
//!
//! A bucket is a flat key space. Keys follow the `{project}/{filename}`
//! convention shared by the resolver and the transfer engine. Large objects
//! are written through multi-part sessions that are committed only once
//! every part is present.

mod backends;

pub use backends::{FilesystemStore, MemoryStore, S3Settings, S3Store};

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use wheelhouse_errors::{Error, StorageError};

/// Canned access policies accepted by [`ObjectStore::set_object_acl`]
pub const CANNED_POLICIES: &[&str] = &[
    "private",
    "public-read",
    "public-read-write",
    "authenticated-read",
    "bucket-owner-read",
    "bucket-owner-full-control",
];

/// Check that `policy` is one of the canned policies
///
/// # Errors
///
/// Returns `StorageError::UnsupportedPolicy` otherwise.
pub fn validate_policy(policy: &str) -> Result<(), Error> {
    if CANNED_POLICIES.contains(&policy) {
        Ok(())
    } else {
        Err(StorageError::UnsupportedPolicy {
            policy: policy.to_string(),
        }
        .into())
    }
}

/// Handle to an open multi-part upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    pub upload_id: String,
    pub key: String,
    pub content_type: String,
}

/// Storage backend operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All object keys in the bucket, sorted
    async fn list_objects(&self) -> Result<Vec<String>, Error>;

    /// Read a whole object
    async fn get_object(&self, key: &str) -> Result<Bytes, Error>;

    /// Write a whole object in one call
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), Error>;

    /// Open a multi-part upload for `key`
    async fn initiate_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<MultipartUpload, Error>;

    /// Store one part; part numbers start at 1 and re-uploading a part replaces it
    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: u32,
        data: Bytes,
    ) -> Result<(), Error>;

    /// Part numbers registered so far, ascending
    async fn list_parts(&self, upload: &MultipartUpload) -> Result<Vec<u32>, Error>;

    /// Assemble the parts in part-number order into the final object
    async fn complete_multipart(&self, upload: &MultipartUpload) -> Result<(), Error>;

    /// Discard the upload and every stored part
    async fn abort_multipart(&self, upload: &MultipartUpload) -> Result<(), Error>;

    /// Apply a canned access policy to an existing object
    async fn set_object_acl(&self, key: &str, policy: &str) -> Result<(), Error>;

    /// Time-limited URL that downloads `key` without credentials
    ///
    /// Backends that cannot hand out such links return
    /// `StorageError::Unsupported`.
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String, Error> {
        let _ = (key, expires_in);
        Err(StorageError::Unsupported {
            backend: self.backend_name().to_string(),
            operation: "presigned urls".to_string(),
        }
        .into())
    }

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Reject keys that are empty, absolute, or contain `.`/`..` components
pub(crate) fn validate_key(key: &str) -> Result<(), Error> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.starts_with('\\')
        || key.starts_with('.')
        || key
            .split('/')
            .any(|segment| segment == "." || segment == "..");
    if invalid {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(validate_key("package_two/package_two-0.0.1.tar.gz").is_ok());
        assert!(validate_key("package_two/").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("a/../../b").is_err());
        assert!(validate_key(".multipart/x").is_err());
    }

    #[test]
    fn test_policy_validation() {
        assert!(validate_policy("public-read").is_ok());
        assert!(matches!(
            validate_policy("world-writable"),
            Err(Error::Storage(StorageError::UnsupportedPolicy { .. }))
        ));
    }
}
