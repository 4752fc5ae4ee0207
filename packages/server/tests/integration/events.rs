use serde_json::json;

use crate::common::{FALLBACK_FOLDER, PUBLIC_BASE_URL, TestApp, TestOptions, routes};

#[tokio::test]
async fn health_check_reports_alive() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({"ok": true, "status": "alive"}));
}

mod create {
    use super::*;

    #[tokio::test]
    async fn empty_body_applies_defaults() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::EVENTS, &json!({})).await;

        assert_eq!(res.status, 200, "{}", res.text());
        let id = res.body["eventId"].as_str().unwrap();
        assert_eq!(res.body["driveFolderId"], FALLBACK_FOLDER);
        assert_eq!(res.body["publicUrl"], format!("{PUBLIC_BASE_URL}/?e={id}"));
        assert_eq!(
            res.body["connectUrl"],
            app.url(&format!("/auth/google/start?eventId={id}"))
        );

        let config = app.get(&routes::event(id)).await;
        assert_eq!(config.body["name"], "Wedding");
        assert_eq!(config.body["uploadLimit"], 4);
        assert_eq!(config.body["windowHours"], 24.0);
    }

    #[tokio::test]
    async fn missing_body_applies_defaults() {
        let app = TestApp::spawn().await;

        let bare = app.client.post(app.url(routes::EVENTS)).send().await.unwrap();
        assert_eq!(bare.status(), 200);
        let body: serde_json::Value = bare.json().await.unwrap();
        assert_eq!(body["driveFolderId"], FALLBACK_FOLDER);

        let config = app
            .get(&routes::event(body["eventId"].as_str().unwrap()))
            .await;
        assert_eq!(config.body["name"], "Wedding");
        assert_eq!(config.body["uploadLimit"], 4);
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_accepted() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::EVENTS))
            .header("Content-Type", "text/plain")
            .body(r#"{"driveFolderId": "folder-9"}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["driveFolderId"], "folder-9");
    }

    #[tokio::test]
    async fn explicit_name_and_folder_are_kept() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::EVENTS,
                &json!({"name": "  Ana & Ben ", "driveFolderId": "folder-123"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["driveFolderId"], "folder-123");
        let id = res.body["eventId"].as_str().unwrap();
        let config = app.get(&routes::event(id)).await;
        assert_eq!(config.body["name"], "Ana & Ben");
    }

    #[tokio::test]
    async fn blank_fields_fall_back_to_defaults() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::EVENTS, &json!({"name": "   ", "driveFolderId": ""}))
            .await;

        assert_eq!(res.body["driveFolderId"], FALLBACK_FOLDER);
        let id = res.body["eventId"].as_str().unwrap();
        let config = app.get(&routes::event(id)).await;
        assert_eq!(config.body["name"], "Wedding");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::EVENTS))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

mod config {
    use super::*;

    #[tokio::test]
    async fn new_event_without_service_account_is_not_connected() {
        let app = TestApp::spawn().await;
        let id = app.create_event().await;

        let res = app.get(&routes::event(&id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["isConnected"], false);
        assert_eq!(res.body["isOwnerConnected"], false);
        assert_eq!(res.body["isServiceAccountActive"], false);
    }

    #[tokio::test]
    async fn service_account_connects_without_owner() {
        let app = TestApp::spawn_with(TestOptions {
            service_account: true,
            ..Default::default()
        })
        .await;
        let id = app.create_event().await;

        let res = app.get(&routes::event(&id)).await;

        assert_eq!(res.body["isConnected"], true);
        assert_eq!(res.body["isOwnerConnected"], false);
        assert_eq!(res.body["isServiceAccountActive"], true);
    }

    #[tokio::test]
    async fn owner_consent_marks_owner_connected() {
        let app = TestApp::spawn().await;
        let id = app.create_connected_event().await;

        let res = app.get(&routes::event(&id)).await;

        assert_eq!(res.body["isConnected"], true);
        assert_eq!(res.body["isOwnerConnected"], true);
    }

    #[tokio::test]
    async fn refresh_token_is_never_exposed() {
        let app = TestApp::spawn().await;
        let id = app.create_connected_event().await;

        let res = app.get(&routes::event(&id)).await;

        assert!(!res.text().contains("refresh-initial"));
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&routes::event("0190f0b4-6a4e-7c1d-9f3b-2a7d5e8c1b00"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_event_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::event("not-a-uuid")).await;

        assert_eq!(res.status, 404);
    }
}
