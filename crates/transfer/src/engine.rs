//! Multi-part upload engine

use std::collections::BTreeSet;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use wheelhouse_errors::{Error, TransferError};
use wheelhouse_events::{EventEmitter, EventSender, FailureContext, TransferEvent};
use wheelhouse_store::{MultipartUpload, ObjectStore};

use crate::plan::{destination_key, Chunk, ChunkPlan, BASE_CHUNK_SIZE};
use crate::retry::{calculate_backoff_delay, RetryConfig};

/// Content type sent when opening a session
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Engine tuning
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum chunks in flight at once
    pub workers: usize,
    pub retry: RetryConfig,
    pub base_chunk_size: u64,
    pub content_type: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            retry: RetryConfig::default(),
            base_chunk_size: BASE_CHUNK_SIZE,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl TransferConfig {
    /// Build from the `[transfer]` section of the configuration file
    #[must_use]
    pub fn from_settings(settings: &wheelhouse_config::TransferConfig) -> Self {
        Self {
            workers: settings.workers.max(1),
            retry: RetryConfig {
                max_retries: settings.retries,
                initial_delay: Duration::from_millis(settings.retry_delay_ms),
                ..RetryConfig::default()
            },
            base_chunk_size: settings.base_chunk_size,
            content_type: settings.content_type.clone(),
        }
    }
}

/// State of one multi-part upload, owned by the engine until commit or abort
#[derive(Debug)]
pub struct TransferSession {
    upload: MultipartUpload,
    plan: ChunkPlan,
    committed_parts: BTreeSet<u32>,
}

impl TransferSession {
    fn new(upload: MultipartUpload, plan: ChunkPlan) -> Self {
        Self {
            upload,
            plan,
            committed_parts: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn upload_id(&self) -> &str {
        &self.upload.upload_id
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.upload.key
    }

    #[must_use]
    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    #[must_use]
    pub fn committed_parts(&self) -> &BTreeSet<u32> {
        &self.committed_parts
    }

    fn committed_count(&self) -> u32 {
        u32::try_from(self.committed_parts.len()).unwrap_or(u32::MAX)
    }

    /// True when the store holds as many parts as were planned
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.committed_count() == self.plan.chunk_count
    }
}

/// Outcome of a committed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    pub key: String,
    pub size: u64,
    pub chunk_size: u64,
    pub parts: u32,
    /// Access policy applied after the commit
    pub acl: Option<String>,
}

/// Uploads local files to an object store as multi-part sessions
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn ObjectStore>,
    config: TransferConfig,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("store", &self.store.backend_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EventEmitter for TransferEngine {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl TransferEngine {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: TransferConfig) -> Self {
        Self {
            store,
            config,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Upload `path` under the key derived from its file name
    ///
    /// # Errors
    ///
    /// Fails when no key can be derived from the file name, or for any
    /// reason listed on [`TransferEngine::upload_to`].
    pub async fn upload(&self, path: &Path, acl: Option<&str>) -> Result<TransferReport, Error> {
        let key = destination_key(path)?;
        self.upload_to(path, &key, acl).await
    }

    /// Upload `path` as the object `key`, then apply `acl` if given
    ///
    /// Every chunk is attempted before the session is checked. The session
    /// is committed only when the store reports one registered part per
    /// planned chunk; otherwise it is aborted.
    ///
    /// # Errors
    ///
    /// - `TransferError::EmptySource` for a zero-byte file
    /// - `TransferError::ChunkUploadFailed` when a chunk exhausts its attempts
    /// - `TransferError::CommitMismatch` when parts are missing after the barrier
    /// - `TransferError::CommitFailed` when the store rejects the commit
    /// - `TransferError::AclFailed` when the policy cannot be applied; the
    ///   object stays committed
    pub async fn upload_to(
        &self,
        path: &Path,
        key: &str,
        acl: Option<&str>,
    ) -> Result<TransferReport, Error> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        let total_size = metadata.len();
        if total_size == 0 {
            return Err(TransferError::EmptySource {
                path: path.display().to_string(),
            }
            .into());
        }

        let plan = ChunkPlan::new(total_size, self.config.base_chunk_size);
        let upload = self
            .store
            .initiate_multipart(key, &self.config.content_type)
            .await?;
        tracing::debug!(
            key,
            upload_id = %upload.upload_id,
            total_size,
            chunk_size = plan.chunk_size,
            chunk_count = plan.chunk_count,
            "opened multipart session"
        );
        self.emit_transfer(TransferEvent::SessionOpened {
            key: key.to_string(),
            upload_id: upload.upload_id.clone(),
            total_size,
            chunk_size: plan.chunk_size,
            chunk_count: plan.chunk_count,
        });

        let mut session = TransferSession::new(upload, plan);
        let chunk_failure = self.upload_chunks(path, &session).await;

        let registered = match self.store.list_parts(&session.upload).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(&session, &e).await;
                return Err(e);
            }
        };
        session.committed_parts = registered.into_iter().collect();

        if !session.is_complete() {
            let error = chunk_failure.unwrap_or_else(|| {
                TransferError::CommitMismatch {
                    key: key.to_string(),
                    expected: session.plan.chunk_count,
                    actual: session.committed_count(),
                }
                .into()
            });
            self.abort(&session, &error).await;
            return Err(error);
        }
        if let Some(e) = chunk_failure {
            tracing::warn!(key, error = %e, "chunk reported failure but every part is registered");
        }

        if let Err(e) = self.store.complete_multipart(&session.upload).await {
            let error: Error = TransferError::CommitFailed {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into();
            self.abort(&session, &error).await;
            return Err(error);
        }
        self.emit_transfer(TransferEvent::Committed {
            key: key.to_string(),
            parts: session.plan.chunk_count,
        });

        if let Some(policy) = acl {
            self.store
                .set_object_acl(key, policy)
                .await
                .map_err(|e| TransferError::AclFailed {
                    key: key.to_string(),
                    policy: policy.to_string(),
                    message: e.to_string(),
                })?;
            self.emit_transfer(TransferEvent::AclApplied {
                key: key.to_string(),
                policy: policy.to_string(),
            });
        }

        Ok(TransferReport {
            key: key.to_string(),
            size: total_size,
            chunk_size: session.plan.chunk_size,
            parts: session.plan.chunk_count,
            acl: acl.map(str::to_string),
        })
    }

    /// Run every chunk through the worker pool and wait for all of them
    ///
    /// Returns the first failure seen, if any. Siblings of a failed chunk
    /// keep running to completion.
    async fn upload_chunks(&self, path: &Path, session: &TransferSession) -> Option<Error> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut first_failure: Option<Error> = None;

        for chunk in session.plan.chunks() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    first_failure = Some(
                        TransferError::WorkerPool {
                            message: format!("failed to acquire worker: {e}"),
                        }
                        .into(),
                    );
                    break;
                }
            };
            let store = Arc::clone(&self.store);
            let upload = session.upload.clone();
            let path = path.to_path_buf();
            let retry = self.config.retry.clone();
            let tx = self.tx.clone();

            tasks.spawn(async move {
                let _permit = permit;
                upload_chunk(store.as_ref(), &upload, &path, chunk, &retry, &tx).await
            });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
                Err(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(
                            TransferError::WorkerPool {
                                message: format!("chunk task failed: {e}"),
                            }
                            .into(),
                        );
                    }
                }
            }
        }

        first_failure
    }

    async fn abort(&self, session: &TransferSession, error: &Error) {
        if let Err(e) = self.store.abort_multipart(&session.upload).await {
            tracing::warn!(
                key = session.key(),
                upload_id = session.upload_id(),
                error = %e,
                "failed to abort multipart session"
            );
        }
        self.emit_transfer(TransferEvent::Aborted {
            key: session.key().to_string(),
            expected_parts: session.plan.chunk_count,
            committed_parts: session.committed_count(),
            failure: FailureContext::from_error(error),
        });
    }
}

/// Upload one chunk, retrying with backoff until the attempt budget runs out
async fn upload_chunk(
    store: &dyn ObjectStore,
    upload: &MultipartUpload,
    path: &Path,
    chunk: Chunk,
    retry: &RetryConfig,
    tx: &impl EventEmitter,
) -> Result<(), Error> {
    let max_attempts = retry.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = match read_chunk(path, chunk).await {
            Ok(data) => store.upload_part(upload, chunk.part_number, data).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tx.emit_transfer(TransferEvent::ChunkUploaded {
                    key: upload.key.clone(),
                    part_number: chunk.part_number,
                    bytes: chunk.length,
                });
                return Ok(());
            }
            Err(e) if attempt < max_attempts => {
                tracing::debug!(
                    key = %upload.key,
                    part_number = chunk.part_number,
                    attempt,
                    error = %e,
                    "chunk upload failed, retrying"
                );
                tx.emit_transfer(TransferEvent::ChunkRetrying {
                    key: upload.key.clone(),
                    part_number: chunk.part_number,
                    attempt,
                    max_attempts,
                    error: e.to_string(),
                });
                let delay = calculate_backoff_delay(retry, attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                return Err(TransferError::ChunkUploadFailed {
                    part_number: chunk.part_number,
                    attempts: attempt,
                    message: e.to_string(),
                }
                .into());
            }
        }
    }
}

async fn read_chunk(path: &Path, chunk: Chunk) -> Result<Bytes, Error> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    file.seek(SeekFrom::Start(chunk.offset))
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    let length = usize::try_from(chunk.length)
        .map_err(|_| Error::internal(format!("chunk of {} bytes exceeds memory", chunk.length)))?;
    let mut buffer = vec![0u8; length];
    file.read_exact(&mut buffer)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    Ok(Bytes::from(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = wheelhouse_config::TransferConfig {
            workers: 0,
            retries: 5,
            retry_delay_ms: 10,
            ..wheelhouse_config::TransferConfig::default()
        };
        let config = TransferConfig::from_settings(&settings);
        assert_eq!(config.workers, 1);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.max_attempts(), 6);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(10));
        assert_eq!(config.base_chunk_size, BASE_CHUNK_SIZE);
        assert_eq!(config.content_type, DEFAULT_CONTENT_TYPE);
    }
}
