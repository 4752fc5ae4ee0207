use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use candid_server::error::AppError;
use candid_server::services::ledger::NewUpload;
use candid_server::services::{DeviceHash, UploadLedger};

use crate::common::TestDb;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn device(id: &str) -> DeviceHash {
    DeviceHash::fingerprint(Some(id), None)
}

fn record(event_id: Uuid, device: &DeviceHash, blob: Option<&str>, created_at: DateTime<Utc>) -> NewUpload {
    NewUpload {
        event_id,
        device_hash: device.clone(),
        blob_id: blob.map(str::to_string),
        uploader_name: String::new(),
        created_at,
    }
}

const T0: i64 = 1_760_000_000;
const HOUR: i64 = 3600;

mod window {
    use super::*;

    #[tokio::test]
    async fn counts_only_uploads_inside_the_window() {
        let db = TestDb::new().await;
        let event = db.event(4, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();
        let now = at(T0 + 23 * HOUR);

        assert_eq!(ledger.count_recent(event.id, &phone, 24.0, now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn window_start_is_inclusive() {
        let db = TestDb::new().await;
        let event = db.event(4, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();

        let exactly = at(T0 + 24 * HOUR);
        let just_after = at(T0 + 24 * HOUR + 1);
        assert_eq!(ledger.count_recent(event.id, &phone, 24.0, exactly).await.unwrap(), 1);
        assert_eq!(ledger.count_recent(event.id, &phone, 24.0, just_after).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fractional_windows_are_honoured() {
        let db = TestDb::new().await;
        let event = db.event(4, 0.5).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();

        assert_eq!(ledger.count_recent(event.id, &phone, 0.5, at(T0 + 29 * 60)).await.unwrap(), 1);
        assert_eq!(ledger.count_recent(event.id, &phone, 0.5, at(T0 + 31 * 60)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn records_without_blob_still_count() {
        let db = TestDb::new().await;
        let event = db.event(1, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, None, at(T0))).await.unwrap();

        let err = ledger
            .check_rate_limit(&event, &phone, at(T0 + HOUR))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LimitExceeded { .. }));
    }
}

mod rate_limit {
    use super::*;

    #[tokio::test]
    async fn allows_until_the_limit_then_rejects() {
        let db = TestDb::new().await;
        let event = db.event(2, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");
        let now = at(T0 + 2 * HOUR);

        ledger.check_rate_limit(&event, &phone, now).await.unwrap();
        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();
        ledger.check_rate_limit(&event, &phone, now).await.unwrap();
        ledger.create(record(event.id, &phone, Some("b"), at(T0 + HOUR))).await.unwrap();

        let err = ledger.check_rate_limit(&event, &phone, now).await.unwrap_err();
        match err {
            // Oldest upload (T0) leaves the window at T0 + 24h.
            AppError::LimitExceeded { retry_after } => {
                assert_eq!(retry_after, (22 * HOUR) as u64)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn limit_uses_the_inclusive_window() {
        let db = TestDb::new().await;
        let event = db.event(1, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();

        assert!(ledger
            .check_rate_limit(&event, &phone, at(T0 + 24 * HOUR))
            .await
            .is_err());
        ledger
            .check_rate_limit(&event, &phone, at(T0 + 24 * HOUR + 1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn retry_after_is_at_least_one_second() {
        let db = TestDb::new().await;
        let event = db.event(1, 1.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();

        let err = ledger
            .check_rate_limit(&event, &phone, at(T0 + HOUR))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LimitExceeded { retry_after: 1 }));
    }

    #[tokio::test]
    async fn devices_and_events_are_counted_separately() {
        let db = TestDb::new().await;
        let first = db.event(1, 24.0).await;
        let second = db.event(1, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");
        let now = at(T0 + HOUR);

        ledger.create(record(first.id, &phone, Some("a"), at(T0))).await.unwrap();

        assert!(ledger.check_rate_limit(&first, &phone, now).await.is_err());
        ledger.check_rate_limit(&first, &device("tablet"), now).await.unwrap();
        ledger.check_rate_limit(&second, &phone, now).await.unwrap();
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn records_without_blob_are_hidden() {
        let db = TestDb::new().await;
        let event = db.event(10, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, None, at(T0))).await.unwrap();
        ledger.create(record(event.id, &phone, Some(""), at(T0 + 1))).await.unwrap();
        let kept = ledger
            .create(record(event.id, &phone, Some("blob-1"), at(T0 + 2)))
            .await
            .unwrap();

        let all = ledger.list_all(event.id, 80).await.unwrap();
        let mine = ledger.list_mine(event.id, &phone).await.unwrap();

        assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![kept.id]);
        assert_eq!(mine.iter().map(|u| u.id).collect::<Vec<_>>(), vec![kept.id]);
    }

    #[tokio::test]
    async fn global_list_is_newest_first_and_limited() {
        let db = TestDb::new().await;
        let event = db.event(10, 24.0).await;
        let ledger = UploadLedger::new(&db.db);

        for i in 0..5 {
            ledger
                .create(record(
                    event.id,
                    &device(&format!("phone-{i}")),
                    Some(&format!("blob-{i}")),
                    at(T0) + Duration::minutes(i),
                ))
                .await
                .unwrap();
        }

        let page = ledger.list_all(event.id, 3).await.unwrap();
        let blobs: Vec<_> = page.iter().filter_map(|u| u.blob_id.clone()).collect();
        assert_eq!(blobs, vec!["blob-4", "blob-3", "blob-2"]);
    }

    #[tokio::test]
    async fn own_list_is_oldest_first() {
        let db = TestDb::new().await;
        let event = db.event(10, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        ledger.create(record(event.id, &phone, Some("late"), at(T0 + 60))).await.unwrap();
        ledger.create(record(event.id, &phone, Some("early"), at(T0))).await.unwrap();
        ledger
            .create(record(event.id, &device("other"), Some("theirs"), at(T0 + 30)))
            .await
            .unwrap();

        let mine = ledger.list_mine(event.id, &phone).await.unwrap();
        let blobs: Vec<_> = mine.iter().filter_map(|u| u.blob_id.clone()).collect();
        assert_eq!(blobs, vec!["early", "late"]);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn find_owned_checks_event_then_device() {
        let db = TestDb::new().await;
        let event = db.event(10, 24.0).await;
        let other_event = db.event(10, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");

        let upload = ledger
            .create(record(event.id, &phone, Some("a"), at(T0)))
            .await
            .unwrap();

        ledger.find_owned(event.id, upload.id, &phone).await.unwrap();
        assert!(matches!(
            ledger.find_owned(other_event.id, upload.id, &phone).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.find_owned(event.id, upload.id, &device("tablet")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.find_owned(event.id, Uuid::now_v7(), &phone).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rename_touches_only_the_device() {
        let db = TestDb::new().await;
        let event = db.event(10, 24.0).await;
        let ledger = UploadLedger::new(&db.db);
        let phone = device("phone");
        let tablet = device("tablet");

        ledger.create(record(event.id, &phone, Some("a"), at(T0))).await.unwrap();
        ledger.create(record(event.id, &phone, None, at(T0 + 1))).await.unwrap();
        ledger.create(record(event.id, &tablet, Some("c"), at(T0 + 2))).await.unwrap();

        let updated = ledger.rename_uploader(event.id, &phone, "Grandpa").await.unwrap();
        assert_eq!(updated, 2);

        let theirs = ledger.list_mine(event.id, &tablet).await.unwrap();
        assert_eq!(theirs[0].uploader_name, "");
        let mine = ledger.list_mine(event.id, &phone).await.unwrap();
        assert_eq!(mine[0].uploader_name, "Grandpa");
    }
}
