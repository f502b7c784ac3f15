//! Filesystem backend behaviour

use bytes::Bytes;
use wheelhouse_errors::{Error, StorageError};
use wheelhouse_store::{FilesystemStore, ObjectStore};

#[tokio::test]
async fn test_put_get_and_list_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();

    store
        .put_object("package_two/package_two-0.0.1.tar.gz", Bytes::from_static(b"src"))
        .await
        .unwrap();
    store
        .put_object("package-one/package-one-1.2.4-py2.py3-none-any.whl", Bytes::from_static(b"whl"))
        .await
        .unwrap();

    let keys = store.list_objects().await.unwrap();
    assert_eq!(
        keys,
        vec![
            "package-one/package-one-1.2.4-py2.py3-none-any.whl".to_string(),
            "package_two/package_two-0.0.1.tar.gz".to_string(),
        ]
    );
    let data = store
        .get_object("package_two/package_two-0.0.1.tar.gz")
        .await
        .unwrap();
    assert_eq!(&data[..], b"src");
}

#[tokio::test]
async fn test_missing_object() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    let err = store.get_object("nope/nope-1.0.zip").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Storage(StorageError::ObjectNotFound { .. })
    ));
}

#[tokio::test]
async fn test_multipart_commit_concatenates_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    let upload = store
        .initiate_multipart("pkg/pkg-1.0.tar.gz", "application/octet-stream")
        .await
        .unwrap();

    store.upload_part(&upload, 3, Bytes::from_static(b"c")).await.unwrap();
    store.upload_part(&upload, 1, Bytes::from_static(b"a")).await.unwrap();
    store.upload_part(&upload, 2, Bytes::from_static(b"b")).await.unwrap();
    // a retried part replaces the earlier copy
    store.upload_part(&upload, 2, Bytes::from_static(b"B")).await.unwrap();

    assert_eq!(store.list_parts(&upload).await.unwrap(), vec![1, 2, 3]);
    // staged parts are invisible until commit
    assert!(store.list_objects().await.unwrap().is_empty());

    store.complete_multipart(&upload).await.unwrap();
    assert_eq!(
        &store.get_object("pkg/pkg-1.0.tar.gz").await.unwrap()[..],
        b"aBc"
    );
    assert_eq!(
        store.list_objects().await.unwrap(),
        vec!["pkg/pkg-1.0.tar.gz".to_string()]
    );
    assert!(!dir.path().join(".multipart").join(&upload.upload_id).exists());
}

#[tokio::test]
async fn test_abort_removes_staging() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    let upload = store
        .initiate_multipart("pkg/pkg-1.0.tar.gz", "application/octet-stream")
        .await
        .unwrap();
    store.upload_part(&upload, 1, Bytes::from_static(b"a")).await.unwrap();

    store.abort_multipart(&upload).await.unwrap();
    assert!(store.list_objects().await.unwrap().is_empty());
    assert!(matches!(
        store.upload_part(&upload, 2, Bytes::from_static(b"b")).await,
        Err(Error::Storage(StorageError::UploadNotFound { .. }))
    ));
}

#[tokio::test]
async fn test_acl_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    store
        .put_object("pkg/pkg-1.0.zip", Bytes::from_static(b"zip"))
        .await
        .unwrap();

    store.set_object_acl("pkg/pkg-1.0.zip", "public-read").await.unwrap();
    assert_eq!(
        store.object_acl("pkg/pkg-1.0.zip").await.unwrap().as_deref(),
        Some("public-read")
    );
    assert!(store.set_object_acl("pkg/pkg-1.0.zip", "everyone").await.is_err());
    assert!(store.list_objects().await.unwrap().len() == 1);
}

#[tokio::test]
async fn test_traversal_keys_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    assert!(store
        .put_object("../escape", Bytes::from_static(b"x"))
        .await
        .is_err());
    assert!(store
        .initiate_multipart("/abs/key", "application/octet-stream")
        .await
        .is_err());
}

#[tokio::test]
async fn test_presigned_url_points_at_object_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    store
        .put_object("demo-pkg/demo_pkg-1.0.0.tar.gz", Bytes::from_static(b"sdist"))
        .await
        .unwrap();

    let url = store
        .presigned_url("demo-pkg/demo_pkg-1.0.0.tar.gz", std::time::Duration::from_secs(300))
        .await
        .unwrap();
    assert!(url.starts_with("file:///"));
    assert!(url.ends_with("/demo-pkg/demo_pkg-1.0.0.tar.gz"));

    let err = store
        .presigned_url("demo-pkg/demo_pkg-2.0.0.tar.gz", std::time::Duration::from_secs(300))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::ObjectNotFound { .. })));
}
