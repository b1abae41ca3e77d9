mod common;

use auth_service::models::Role;
use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_reset_request_is_not_an_account_oracle() {
    let app = TestApp::spawn();

    let (status, _) = app
        .post_json(
            "/auth/password-reset/request",
            json!({ "email": "nobody@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.emails.sent().is_empty());
}

#[tokio::test]
async fn test_full_password_reset_flow() {
    let app = TestApp::spawn();
    app.seed_user(
        "reset@example.com",
        "original-pass-1",
        Role::User,
        None,
        None,
    );

    // An existing session that the reset must kill.
    let (_, session) = app
        .post_json(
            "/auth/login",
            json!({ "email": "reset@example.com", "password": "original-pass-1" }),
        )
        .await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = app
        .post_json(
            "/auth/password-reset/request",
            json!({ "email": "reset@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = app
        .emails
        .last_token("password_reset", "reset@example.com")
        .expect("reset email not sent");

    let (status, _) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": token, "new_password": "brand-new-pass-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Single-use: the same token is gone.
    let (status, _) = app
        .post_json(
            "/auth/password-reset/confirm",
            json!({ "token": token, "new_password": "another-pass-3" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Every pre-reset session is revoked.
    let (status, _) = app
        .post_json("/auth/refresh", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Old password dead, new password live.
    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "reset@example.com", "password": "original-pass-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({ "email": "reset@example.com", "password": "brand-new-pass-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_token_rejected_in_other_flows() {
    let app = TestApp::spawn();
    app.seed_user(
        "crossed@example.com",
        "some-password-1",
        Role::User,
        None,
        None,
    );

    let (status, _) = app
        .post_json(
            "/auth/password-reset/request",
            json!({ "email": "crossed@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = app
        .emails
        .last_token("password_reset", "crossed@example.com")
        .unwrap();

    // A reset token is not a verification token.
    let (status, _) = app.get(&format!("/auth/verify?token={}", token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nor an invitation.
    let (status, _) = app
        .get(&format!("/auth/invitations/validate?token={}", token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
