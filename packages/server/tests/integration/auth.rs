use serde_json::json;

use crate::common::{TestApp, TestOptions, routes};

async fn app_with_passcode() -> TestApp {
    TestApp::spawn_with(TestOptions {
        admin_passcode: Some("letmein".into()),
        ..Default::default()
    })
    .await
}

#[tokio::test]
async fn correct_passcode_is_accepted() {
    let app = app_with_passcode().await;

    let res = app
        .post(routes::ADMIN_CHECK, &json!({"passcode": " letmein "}))
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({"ok": true}));
}

#[tokio::test]
async fn wrong_or_empty_passcode_is_unauthorized() {
    let app = app_with_passcode().await;

    let wrong = app
        .post(routes::ADMIN_CHECK, &json!({"passcode": "letmeout"}))
        .await;
    let empty = app.post(routes::ADMIN_CHECK, &json!({})).await;

    assert_eq!(wrong.status, 401);
    assert_eq!(wrong.body["code"], "INVALID_PASSCODE");
    assert_eq!(empty.status, 401);
}

#[tokio::test]
async fn unconfigured_passcode_is_a_server_error() {
    let app = TestApp::spawn().await;

    let res = app
        .post(routes::ADMIN_CHECK, &json!({"passcode": "anything"}))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "NOT_CONFIGURED");
}
