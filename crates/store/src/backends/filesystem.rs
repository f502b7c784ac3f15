//! Local filesystem backend
//!
//! Layout under the bucket root:
//! - `{key}` - committed objects
//! - `.multipart/{upload_id}/target` - key the upload will be committed to
//! - `.multipart/{upload_id}/part-NNNNN` - staged parts
//! - `.acl/{key}` - canned access policy of an object

use crate::{validate_key, validate_policy, MultipartUpload, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use wheelhouse_errors::{Error, StorageError};

const STAGING_DIR: &str = ".multipart";
const ACL_DIR: &str = ".acl";
const TARGET_FILE: &str = "target";
const PART_PREFIX: &str = "part-";

/// Bucket backed by a directory tree
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Open a bucket rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &root))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Access policy recorded for `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the policy file exists but cannot be read.
    pub async fn object_acl(&self, key: &str) -> Result<Option<String>, Error> {
        validate_key(key)?;
        let path = self.root.join(ACL_DIR).join(key);
        match fs::read_to_string(&path).await {
            Ok(policy) => Ok(Some(policy.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_io_with_path(&e, &path).into()),
        }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, Error> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn staging_path(&self, upload: &MultipartUpload) -> PathBuf {
        self.root.join(STAGING_DIR).join(&upload.upload_id)
    }

    fn part_file_name(part_number: u32) -> String {
        format!("{PART_PREFIX}{part_number:05}")
    }

    async fn ensure_parent(path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
        }
        Ok(())
    }

    /// Write `data` next to `path` and rename it into place
    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), Error> {
        Self::ensure_parent(path).await?;
        let temp_name = format!(
            ".{}.tmp.{}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Uuid::new_v4()
        );
        let temp_path = path.with_file_name(temp_name);
        {
            let mut file = fs::File::create(&temp_path)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &temp_path))?;
            file.write_all(data).await.map_err(StorageError::from)?;
            file.sync_all().await.map_err(StorageError::from)?;
        }
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;
        Ok(())
    }

    async fn ensure_upload(&self, upload: &MultipartUpload) -> Result<PathBuf, Error> {
        let staging = self.staging_path(upload);
        if fs::try_exists(staging.join(TARGET_FILE))
            .await
            .unwrap_or(false)
        {
            Ok(staging)
        } else {
            Err(StorageError::UploadNotFound {
                upload_id: upload.upload_id.clone(),
            }
            .into())
        }
    }

    async fn staged_parts(staging: &Path) -> Result<Vec<u32>, Error> {
        let mut parts = Vec::new();
        let mut entries = fs::read_dir(staging)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, staging))?;
        while let Some(entry) = entries.next_entry().await.map_err(StorageError::from)? {
            let name = entry.file_name();
            if let Some(number) = name
                .to_str()
                .and_then(|n| n.strip_prefix(PART_PREFIX))
                .and_then(|n| n.parse::<u32>().ok())
            {
                parts.push(number);
            }
        }
        parts.sort_unstable();
        Ok(parts)
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn list_objects(&self) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &dir))?;
            while let Some(entry) = entries.next_entry().await.map_err(StorageError::from)? {
                let name = entry.file_name();
                // staging, policy and temp files all start with a dot
                if name.to_string_lossy().starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await.map_err(StorageError::from)?;
                let path = entry.path();
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        let key: Vec<String> = rel
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy().into_owned())
                            .collect();
                        keys.push(key.join("/"));
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound {
                    key: key.to_string(),
                }
                .into())
            }
            Err(e) => Err(StorageError::from_io_with_path(&e, &path).into()),
        }
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), Error> {
        let path = self.key_path(key)?;
        Self::write_atomic(&path, &data).await
    }

    async fn initiate_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<MultipartUpload, Error> {
        validate_key(key)?;
        let upload = MultipartUpload {
            upload_id: Uuid::new_v4().to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
        };
        let staging = self.staging_path(&upload);
        Self::write_atomic(&staging.join(TARGET_FILE), key.as_bytes()).await?;
        tracing::debug!(key, upload_id = %upload.upload_id, "opened multipart upload");
        Ok(upload)
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
        let staging = self.ensure_upload(upload).await?;
        Self::write_atomic(&staging.join(Self::part_file_name(part_number)), &data).await
    }

    async fn list_parts(&self, upload: &MultipartUpload) -> Result<Vec<u32>, Error> {
        let staging = self.ensure_upload(upload).await?;
        Self::staged_parts(&staging).await
    }

    async fn complete_multipart(&self, upload: &MultipartUpload) -> Result<(), Error> {
        let staging = self.ensure_upload(upload).await?;
        let parts = Self::staged_parts(&staging).await?;
        if parts.is_empty() {
            return Err(StorageError::InvalidPart {
                upload_id: upload.upload_id.clone(),
                part_number: 0,
            }
            .into());
        }

        let assembled = staging.join(".assembled");
        {
            let mut out = fs::File::create(&assembled)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &assembled))?;
            for part in parts {
                let part_path = staging.join(Self::part_file_name(part));
                let data = fs::read(&part_path)
                    .await
                    .map_err(|e| StorageError::from_io_with_path(&e, &part_path))?;
                out.write_all(&data).await.map_err(StorageError::from)?;
            }
            out.sync_all().await.map_err(StorageError::from)?;
        }

        let destination = self.key_path(&upload.key)?;
        Self::ensure_parent(&destination).await?;
        fs::rename(&assembled, &destination)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &destination))?;
        fs::remove_dir_all(&staging)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &staging))?;
        Ok(())
    }

    async fn abort_multipart(&self, upload: &MultipartUpload) -> Result<(), Error> {
        let staging = self.ensure_upload(upload).await?;
        fs::remove_dir_all(&staging)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &staging))?;
        tracing::debug!(key = %upload.key, upload_id = %upload.upload_id, "aborted multipart upload");
        Ok(())
    }

    async fn set_object_acl(&self, key: &str, policy: &str) -> Result<(), Error> {
        validate_policy(policy)?;
        let object = self.key_path(key)?;
        if !fs::try_exists(&object).await.unwrap_or(false) {
            return Err(StorageError::ObjectNotFound {
                key: key.to_string(),
            }
            .into());
        }
        Self::write_atomic(&self.root.join(ACL_DIR).join(key), policy.as_bytes()).await
    }

    /// `file://` URL of the object; local paths do not expire
    async fn presigned_url(&self, key: &str, _expires_in: Duration) -> Result<String, Error> {
        let path = self.key_path(key)?;
        if !fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &path))?
        {
            return Err(StorageError::ObjectNotFound {
                key: key.to_string(),
            }
            .into());
        }
        let absolute =
            std::path::absolute(&path).map_err(|e| StorageError::from_io_with_path(&e, &path))?;
        url::Url::from_file_path(&absolute)
            .map(String::from)
            .map_err(|()| {
                StorageError::InvalidKey {
                    key: key.to_string(),
                }
                .into()
            })
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
