use bytes::Bytes;
use futures::StreamExt;

use ::common::storage::memory::MemoryBlobStore;
use candid_server::error::AppError;
use candid_server::services::{BlobProxy, CredentialResolver, DeviceHash, UploadFile, UploadLedger};

use crate::common::{TestDb, service_account};

fn photo() -> UploadFile {
    UploadFile {
        data: Bytes::from_static(b"\xff\xd8\xff\xe0photo"),
        mime_type: "image/jpeg".into(),
    }
}

#[tokio::test]
async fn guest_lifecycle() {
    let db = TestDb::new().await;
    let store = MemoryBlobStore::new();
    let credentials = CredentialResolver::new(Some(service_account()));
    let proxy = BlobProxy::new(&db.db, &store, &credentials);

    let event = db.event(1, 1.0).await;
    let abc = DeviceHash::fingerprint(Some("abc"), None);
    let xyz = DeviceHash::fingerprint(Some("xyz"), None);

    let first = proxy.upload(event.id, &abc, photo(), None).await.unwrap();
    assert!(first.blob_id.as_deref().is_some_and(|id| !id.is_empty()));

    let err = proxy.upload(event.id, &abc, photo(), None).await.unwrap_err();
    assert!(matches!(err, AppError::LimitExceeded { .. }));

    proxy.upload(event.id, &xyz, photo(), None).await.unwrap();

    let err = proxy.delete(event.id, first.id, &xyz).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    proxy.delete(event.id, first.id, &abc).await.unwrap();

    let mine = UploadLedger::new(&db.db).list_mine(event.id, &abc).await.unwrap();
    assert!(mine.is_empty());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn preconditions_are_checked_in_order() {
    let db = TestDb::new().await;
    let store = MemoryBlobStore::new();
    let unconnected = CredentialResolver::new(None);
    let proxy = BlobProxy::new(&db.db, &store, &unconnected);
    let event = db.event(1, 1.0).await;
    let phone = DeviceHash::fingerprint(Some("phone"), None);

    // Not connected wins over a non-image payload.
    let pdf = UploadFile {
        data: Bytes::from_static(b"%PDF"),
        mime_type: "application/pdf".into(),
    };
    let err = proxy.upload(event.id, &phone, pdf.clone(), None).await.unwrap_err();
    assert!(matches!(err, AppError::NotConnected { .. }));

    let credentials = CredentialResolver::new(Some(service_account()));
    let proxy = BlobProxy::new(&db.db, &store, &credentials);
    let err = proxy.upload(event.id, &phone, pdf, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidContent(_)));

    let err = proxy
        .upload(uuid::Uuid::now_v7(), &phone, photo(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn owner_token_takes_precedence_over_service_account() {
    let db = TestDb::new().await;
    let store = MemoryBlobStore::new();
    let credentials = CredentialResolver::new(Some(service_account()));
    let proxy = BlobProxy::new(&db.db, &store, &credentials);
    let event = db.event(4, 24.0).await;
    candid_server::services::EventStore::new(&db.db)
        .set_owner_token(event.id, "owner-refresh")
        .await
        .unwrap();
    let phone = DeviceHash::fingerprint(Some("phone"), None);

    proxy.upload(event.id, &phone, photo(), None).await.unwrap();

    assert_eq!(
        store.last_credential(),
        Some(::common::storage::DriveCredential::OwnerToken("owner-refresh".into()))
    );
}

#[tokio::test]
async fn stream_serves_only_registered_blobs() {
    let db = TestDb::new().await;
    let store = MemoryBlobStore::new();
    let credentials = CredentialResolver::new(Some(service_account()));
    let proxy = BlobProxy::new(&db.db, &store, &credentials);
    let event = db.event(4, 24.0).await;
    let other = db.event(4, 24.0).await;
    let phone = DeviceHash::fingerprint(Some("phone"), None);

    let upload = proxy
        .upload(event.id, &phone, photo(), Some("  Nana "))
        .await
        .unwrap();
    assert_eq!(upload.uploader_name, "Nana");
    let blob_id = upload.blob_id.unwrap();

    let source = proxy.stream_source(event.id, &blob_id).await.unwrap();
    assert_eq!(source.content_type.as_deref(), Some("image/jpeg"));
    let body: Vec<u8> = source
        .body
        .map(|chunk| chunk.unwrap().to_vec())
        .concat()
        .await;
    assert_eq!(body, b"\xff\xd8\xff\xe0photo");

    assert!(matches!(
        proxy.stream_source(other.id, &blob_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        proxy.stream_source(event.id, "").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_without_credential_still_removes_record() {
    let db = TestDb::new().await;
    let store = MemoryBlobStore::new();
    let with_sa = CredentialResolver::new(Some(service_account()));
    let event = db.event(4, 24.0).await;
    let phone = DeviceHash::fingerprint(Some("phone"), None);

    let upload = BlobProxy::new(&db.db, &store, &with_sa)
        .upload(event.id, &phone, photo(), None)
        .await
        .unwrap();

    let without = CredentialResolver::new(None);
    BlobProxy::new(&db.db, &store, &without)
        .delete(event.id, upload.id, &phone)
        .await
        .unwrap();

    assert_eq!(store.len(), 1);
    let ledger = UploadLedger::new(&db.db);
    assert!(matches!(ledger.find(upload.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn comment_is_trimmed_and_stamped() {
    let db = TestDb::new().await;
    let store = MemoryBlobStore::new();
    let credentials = CredentialResolver::new(Some(service_account()));
    let proxy = BlobProxy::new(&db.db, &store, &credentials);
    let event = db.event(4, 24.0).await;
    let phone = DeviceHash::fingerprint(Some("phone"), None);
    let upload = proxy.upload(event.id, &phone, photo(), None).await.unwrap();
    assert!(upload.updated_at.is_none());

    let updated = proxy
        .set_comment(event.id, upload.id, &phone, Some("  first dance  "))
        .await
        .unwrap();
    assert_eq!(updated.comment, "first dance");
    assert!(updated.updated_at.is_some());

    let cleared = proxy
        .set_comment(event.id, upload.id, &phone, None)
        .await
        .unwrap();
    assert_eq!(cleared.comment, "");

    let stranger = DeviceHash::fingerprint(Some("stranger"), None);
    assert!(matches!(
        proxy.set_comment(event.id, upload.id, &stranger, Some("hi")).await,
        Err(AppError::Forbidden(_))
    ));
}
