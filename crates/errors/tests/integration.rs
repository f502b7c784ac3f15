//! Integration tests for error types

#[cfg(test)]
mod tests {
    use wheelhouse_errors::*;

    #[test]
    fn test_ambiguous_lists_candidates_in_order() {
        let err: Error = ResolveError::Ambiguous {
            requirement: "package-one==1.0".to_string(),
            candidates: vec![
                "package-one/package_one-1.0-py3-none-any.whl".to_string(),
                "package-one/package_one-1.0-cp312-cp312-manylinux_2_17_x86_64.whl".to_string(),
            ],
        }
        .into();

        assert!(matches!(err, Error::Resolve(ResolveError::Ambiguous { .. })));
        assert_eq!(
            err.user_message(),
            "found too many results for package-one==1.0:\n  \
             package-one/package_one-1.0-py3-none-any.whl\n  \
             package-one/package_one-1.0-cp312-cp312-manylinux_2_17_x86_64.whl"
        );
        assert_eq!(err.user_code(), Some("resolve.ambiguous"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_not_found_names_requirement() {
        let err: Error = ResolveError::NotFound {
            requirement: "package-two<1.2.4".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "package package-two<1.2.4 not found");
        assert_eq!(err.user_code(), Some("resolve.not_found"));
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_transfer_codes_and_retryability() {
        let mismatch: Error = TransferError::CommitMismatch {
            key: "pkg/pkg-1.0.tar.gz".to_string(),
            expected: 3,
            actual: 2,
        }
        .into();
        assert_eq!(mismatch.user_code(), Some("transfer.commit_mismatch"));
        assert!(mismatch.is_retryable());
        assert_eq!(
            mismatch.to_string(),
            "transfer error: upload of pkg/pkg-1.0.tar.gz incomplete: 2 of 3 parts registered"
        );

        let exhausted: Error = TransferError::ChunkUploadFailed {
            part_number: 4,
            attempts: 4,
            message: "connection reset".to_string(),
        }
        .into();
        assert_eq!(exhausted.user_code(), Some("transfer.chunk_upload_failed"));
        assert!(exhausted.is_retryable());

        let empty: Error = TransferError::EmptySource {
            path: "dist/pkg-1.0.tar.gz".to_string(),
        }
        .into();
        assert_eq!(empty.user_code(), Some("transfer.empty_source"));
        assert!(!empty.is_retryable());

        let acl: Error = TransferError::AclFailed {
            key: "pkg/pkg-1.0.tar.gz".to_string(),
            policy: "public-read".to_string(),
            message: "denied".to_string(),
        }
        .into();
        assert_eq!(acl.user_code(), Some("transfer.acl_failed"));
        assert!(!acl.is_retryable());
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io_with_path(&io_err, "/srv/bucket");
        assert_eq!(err.user_message(), "/srv/bucket: denied");
        assert_eq!(err.user_code(), Some("error.io"));

        let storage = StorageError::from_io_with_path(&io_err, std::path::Path::new("/srv/bucket"));
        assert!(matches!(storage, StorageError::PermissionDenied { .. }));
    }

    #[test]
    fn test_unsupported_store_operation() {
        let err: Error = StorageError::Unsupported {
            backend: "memory".to_string(),
            operation: "presigned urls".to_string(),
        }
        .into();
        assert_eq!(err.user_message(), "memory store does not support presigned urls");
        assert_eq!(err.user_code(), Some("storage.unsupported"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_download_failure_is_retryable() {
        let err: Error = OpsError::DownloadFailed {
            requirement: "package-one==1.0".to_string(),
            message: "pip exited with status 1".to_string(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "failed to download package-one==1.0: pip exited with status 1"
        );
        assert_eq!(err.user_code(), Some("ops.download_failed"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_store_names_both_settings() {
        let err: Error = ConfigError::MissingField {
            field: "store.bucket".to_string(),
        }
        .into();
        let hint = err.user_hint().unwrap_or_default();
        assert!(hint.contains("--bucket"));
        assert!(hint.contains("--store"));
    }
}
