//! In-memory backend

use crate::{validate_key, validate_policy, MultipartUpload, ObjectStore};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use std::collections::BTreeMap;
use uuid::Uuid;
use wheelhouse_errors::{Error, StorageError};

#[derive(Debug, Default)]
struct PendingUpload {
    key: String,
    parts: BTreeMap<u32, Bytes>,
}

/// Bucket held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, Bytes>,
    uploads: DashMap<String, PendingUpload>,
    acls: DashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with empty objects under `keys`
    #[must_use]
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for key in keys {
            store.objects.insert(key.into(), Bytes::new());
        }
        store
    }

    /// Access policy recorded for `key`
    #[must_use]
    pub fn object_acl(&self, key: &str) -> Option<String> {
        self.acls.get(key).map(|entry| entry.value().clone())
    }

    /// Number of multi-part uploads still open
    #[must_use]
    pub fn open_uploads(&self) -> usize {
        self.uploads.len()
    }

    fn upload_not_found(upload: &MultipartUpload) -> Error {
        StorageError::UploadNotFound {
            upload_id: upload.upload_id.clone(),
        }
        .into()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self) -> Result<Vec<String>, Error> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                StorageError::ObjectNotFound {
                    key: key.to_string(),
                }
                .into()
            })
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), Error> {
        validate_key(key)?;
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn initiate_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<MultipartUpload, Error> {
        validate_key(key)?;
        let upload_id = Uuid::new_v4().to_string();
        self.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(MultipartUpload {
            upload_id,
            key: key.to_string(),
            content_type: content_type.to_string(),
        })
    }

    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: u32,
        data: Bytes,
    ) -> Result<(), Error> {
        if part_number == 0 {
            return Err(StorageError::InvalidPart {
                upload_id: upload.upload_id.clone(),
                part_number,
            }
            .into());
        }
        let mut pending = self
            .uploads
            .get_mut(&upload.upload_id)
            .ok_or_else(|| Self::upload_not_found(upload))?;
        pending.parts.insert(part_number, data);
        Ok(())
    }

    async fn list_parts(&self, upload: &MultipartUpload) -> Result<Vec<u32>, Error> {
        let pending = self
            .uploads
            .get(&upload.upload_id)
            .ok_or_else(|| Self::upload_not_found(upload))?;
        Ok(pending.parts.keys().copied().collect())
    }

    async fn complete_multipart(&self, upload: &MultipartUpload) -> Result<(), Error> {
        let (_, pending) = self
            .uploads
            .remove(&upload.upload_id)
            .ok_or_else(|| Self::upload_not_found(upload))?;
        let mut assembled = BytesMut::new();
        for part in pending.parts.values() {
            assembled.extend_from_slice(part);
        }
        self.objects.insert(pending.key, assembled.freeze());
        Ok(())
    }

    async fn abort_multipart(&self, upload: &MultipartUpload) -> Result<(), Error> {
        self.uploads
            .remove(&upload.upload_id)
            .map(|_| ())
            .ok_or_else(|| Self::upload_not_found(upload))
    }

    async fn set_object_acl(&self, key: &str, policy: &str) -> Result<(), Error> {
        validate_policy(policy)?;
        if !self.objects.contains_key(key) {
            return Err(StorageError::ObjectNotFound {
                key: key.to_string(),
            }
            .into());
        }
        self.acls.insert(key.to_string(), policy.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parts_assemble_in_part_order() {
        let store = MemoryStore::new();
        let upload = store
            .initiate_multipart("pkg/pkg-1.0.tar.gz", "application/octet-stream")
            .await
            .unwrap();
        store
            .upload_part(&upload, 2, Bytes::from_static(b"world"))
            .await
            .unwrap();
        store
            .upload_part(&upload, 1, Bytes::from_static(b"hello "))
            .await
            .unwrap();
        assert_eq!(store.list_parts(&upload).await.unwrap(), vec![1, 2]);

        store.complete_multipart(&upload).await.unwrap();
        let data = store.get_object("pkg/pkg-1.0.tar.gz").await.unwrap();
        assert_eq!(&data[..], b"hello world");
        assert_eq!(store.open_uploads(), 0);
    }

    #[tokio::test]
    async fn test_abort_discards_parts() {
        let store = MemoryStore::new();
        let upload = store
            .initiate_multipart("pkg/pkg-1.0.tar.gz", "application/octet-stream")
            .await
            .unwrap();
        store
            .upload_part(&upload, 1, Bytes::from_static(b"x"))
            .await
            .unwrap();
        store.abort_multipart(&upload).await.unwrap();

        assert!(store.list_objects().await.unwrap().is_empty());
        assert!(store.list_parts(&upload).await.is_err());
    }

    #[tokio::test]
    async fn test_acl_requires_object() {
        let store = MemoryStore::with_keys(["pkg/pkg-1.0.tar.gz"]);
        assert!(store.set_object_acl("pkg/other.tar.gz", "private").await.is_err());
        store
            .set_object_acl("pkg/pkg-1.0.tar.gz", "public-read")
            .await
            .unwrap();
        assert_eq!(
            store.object_acl("pkg/pkg-1.0.tar.gz").as_deref(),
            Some("public-read")
        );
    }

    #[tokio::test]
    async fn test_presigned_url_unsupported() {
        let store = MemoryStore::with_keys(["pkg/pkg-1.0.tar.gz"]);
        let err = store
            .presigned_url("pkg/pkg-1.0.tar.gz", std::time::Duration::from_secs(300))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::Unsupported { ref backend, .. }) if backend == "memory"
        ));
    }
}
