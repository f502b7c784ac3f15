//! S3-compatible backend
//!
//! Multi-part sessions map one-to-one onto S3 multipart uploads. Part ETags
//! are read back from `ListParts` when the upload is committed, so the
//! caller never has to carry them around.

use crate::{validate_key, validate_policy, MultipartUpload, ObjectStore};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, instrument};
use wheelhouse_errors::{Error, StorageError};

const DEFAULT_REGION: &str = "us-east-1";
const STATIC_CREDENTIALS_SOURCE: &str = "wheelhouse-config";

/// Connection settings for an S3 bucket
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services; bare `host:port` means plain HTTP
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub force_path_style: bool,
}

/// Bucket on S3 or an S3-compatible service
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    /// Build a client for `settings.bucket`
    ///
    /// Explicit keys take precedence; otherwise the default AWS credential
    /// chain (environment, profile, instance metadata) is used.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` when only one of the two keys is set.
    pub async fn new(settings: &S3Settings) -> Result<Self, Error> {
        let region = Region::new(
            settings
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(region.clone())
            .force_path_style(settings.force_path_style);

        match (&settings.access_key, &settings.secret_key) {
            (Some(key), Some(secret)) => {
                builder = builder.credentials_provider(Credentials::new(
                    key,
                    secret,
                    None,
                    None,
                    STATIC_CREDENTIALS_SOURCE,
                ));
            }
            (None, None) => {
                let chain = aws_config::default_provider::credentials::DefaultCredentialsChain::builder()
                    .region(region)
                    .build()
                    .await;
                builder = builder.credentials_provider(chain);
            }
            _ => {
                return Err(StorageError::Backend {
                    message: "access key and secret key must be set together".to_string(),
                }
                .into())
            }
        }

        if let Some(endpoint) = settings.endpoint.as_deref() {
            builder = builder.endpoint_url(normalize_endpoint(endpoint));
        }

        debug!(bucket = %settings.bucket, "opened s3 bucket");
        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        })
    }

    /// Name of the bucket
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn part_number(upload: &MultipartUpload, part_number: u32) -> Result<i32, Error> {
        match i32::try_from(part_number) {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(StorageError::InvalidPart {
                upload_id: upload.upload_id.clone(),
                part_number,
            }
            .into()),
        }
    }

    /// Part numbers and ETags of an upload, ascending
    async fn uploaded_parts(&self, upload: &MultipartUpload) -> Result<Vec<(u32, String)>, Error> {
        let mut parts = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut request = self
                .client
                .list_parts()
                .bucket(&self.bucket)
                .key(&upload.key)
                .upload_id(&upload.upload_id);
            if let Some(marker) = marker.take() {
                request = request.part_number_marker(marker);
            }
            let output = request
                .send()
                .await
                .map_err(|e| upload_error(&e, upload))?;

            for part in output.parts() {
                if let (Some(number), Some(etag)) = (part.part_number(), part.e_tag()) {
                    if let Ok(number) = u32::try_from(number) {
                        parts.push((number, etag.to_string()));
                    }
                }
            }

            match output.next_part_number_marker() {
                Some(next) if output.is_truncated().unwrap_or(false) => {
                    marker = Some(next.to_string());
                }
                _ => break,
            }
        }
        parts.sort_by_key(|(number, _)| *number);
        Ok(parts)
    }
}

/// Prefix bare `host:port` endpoints with `http://`
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let lower = endpoint.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

type HttpResponse = aws_sdk_s3::config::http::HttpResponse;

fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

fn backend_error<E>(err: &SdkError<E, HttpResponse>) -> Error
where
    E: std::error::Error + 'static,
{
    StorageError::Backend {
        message: DisplayErrorContext(err).to_string(),
    }
    .into()
}

fn object_error<E>(err: &SdkError<E, HttpResponse>, key: &str) -> Error
where
    E: std::error::Error + 'static,
{
    if status_of(err) == Some(404) {
        return StorageError::ObjectNotFound {
            key: key.to_string(),
        }
        .into();
    }
    backend_error(err)
}

fn upload_error<E>(
    err: &SdkError<E, HttpResponse>,
    upload: &MultipartUpload,
) -> Error
where
    E: std::error::Error + 'static,
{
    if status_of(err) == Some(404) {
        return StorageError::UploadNotFound {
            upload_id: upload.upload_id.clone(),
        }
        .into();
    }
    backend_error(err)
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_objects(&self) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = token.take() {
                request = request.continuation_token(token);
            }
            let output = request.send().await.map_err(|e| backend_error(&e))?;
            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
            match output.next_continuation_token() {
                Some(next) if output.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string());
                }
                _ => break,
            }
        }
        keys.sort();
        Ok(keys)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        validate_key(key)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| object_error(&e, key))?;
        let data = output.body.collect().await.map_err(|e| StorageError::Backend {
            message: e.to_string(),
        })?;
        Ok(data.into_bytes())
    }

    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), Error> {
        validate_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(data.into())
            .send()
            .await
            .map_err(|e| backend_error(&e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn initiate_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<MultipartUpload, Error> {
        validate_key(key)?;
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| backend_error(&e))?;
        let upload_id = output
            .upload_id()
            .ok_or_else(|| StorageError::Backend {
                message: format!("no upload id returned for {key}"),
            })?
            .to_string();
        Ok(MultipartUpload {
            upload_id,
            key: key.to_string(),
            content_type: content_type.to_string(),
        })
    }

    #[instrument(skip(self, upload, data), fields(key = %upload.key, size = data.len()))]
    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: u32,
        data: Bytes,
    ) -> Result<(), Error> {
        let number = Self::part_number(upload, part_number)?;
        self.client
            .upload_part()
            .bucket(&self.bucket)
            .key(&upload.key)
            .upload_id(&upload.upload_id)
            .part_number(number)
            .body(data.into())
            .send()
            .await
            .map_err(|e| upload_error(&e, upload))?;
        Ok(())
    }

    async fn list_parts(&self, upload: &MultipartUpload) -> Result<Vec<u32>, Error> {
        Ok(self
            .uploaded_parts(upload)
            .await?
            .into_iter()
            .map(|(number, _)| number)
            .collect())
    }

    #[instrument(skip(self, upload), fields(key = %upload.key))]
    async fn complete_multipart(&self, upload: &MultipartUpload) -> Result<(), Error> {
        let mut completed = Vec::new();
        for (number, etag) in self.uploaded_parts(upload).await? {
            completed.push(
                CompletedPart::builder()
                    .part_number(Self::part_number(upload, number)?)
                    .e_tag(etag)
                    .build(),
            );
        }
        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&upload.key)
            .upload_id(&upload.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| upload_error(&e, upload))?;
        Ok(())
    }

    async fn abort_multipart(&self, upload: &MultipartUpload) -> Result<(), Error> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(&upload.key)
            .upload_id(&upload.upload_id)
            .send()
            .await
            .map_err(|e| upload_error(&e, upload))?;
        Ok(())
    }

    async fn set_object_acl(&self, key: &str, policy: &str) -> Result<(), Error> {
        validate_key(key)?;
        validate_policy(policy)?;
        self.client
            .put_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(policy))
            .send()
            .await
            .map_err(|e| object_error(&e, key))?;
        Ok(())
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String, Error> {
        validate_key(key)?;
        let config = PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Backend {
            message: e.to_string(),
        })?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| backend_error(&e))?;
        Ok(request.uri().to_string())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_settings() -> S3Settings {
        S3Settings {
            bucket: "wheels".to_string(),
            region: Some("us-east-1".to_string()),
            endpoint: Some("localhost:9000".to_string()),
            access_key: Some("AKIDEXAMPLE".to_string()),
            secret_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
            force_path_style: true,
        }
    }

    #[test]
    fn test_endpoint_normalization() {
        assert_eq!(normalize_endpoint("minio:9000"), "http://minio:9000");
        assert_eq!(
            normalize_endpoint("https://s3.eu-west-1.amazonaws.com"),
            "https://s3.eu-west-1.amazonaws.com"
        );
        assert_eq!(normalize_endpoint("HTTP://minio:9000"), "HTTP://minio:9000");
    }

    #[tokio::test]
    async fn test_presigned_get_url() {
        let store = S3Store::new(&local_settings()).await.unwrap();
        assert_eq!(store.bucket(), "wheels");

        let url = store
            .presigned_url("demo-pkg/demo_pkg-1.0.0.tar.gz", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/wheels/demo-pkg/demo_pkg-1.0.0.tar.gz?"));
        assert!(url.contains("X-Amz-Expires=300"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_half_credentials_rejected() {
        let settings = S3Settings {
            secret_key: None,
            ..local_settings()
        };
        let err = S3Store::new(&settings).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Backend { .. })));
    }

    #[test]
    fn test_part_number_bounds() {
        let upload = MultipartUpload {
            upload_id: "abc".to_string(),
            key: "pkg/pkg-1.0.tar.gz".to_string(),
            content_type: "application/octet-stream".to_string(),
        };
        assert_eq!(S3Store::part_number(&upload, 1).unwrap(), 1);
        assert!(S3Store::part_number(&upload, 0).is_err());
        assert!(S3Store::part_number(&upload, u32::MAX).is_err());
    }
}
