mod common;

use auth_service::models::{Identity, Role, SpecialTokenKind};
use common::TestApp;

fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        role: Role::Admin,
        org_id: Some("org_a".to_string()),
        branch_id: Some("branch_x".to_string()),
    }
}

#[tokio::test]
async fn test_issued_access_token_verifies_to_matching_claims() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;

    let pair = tokens.issue_token_pair(&identity("user_1")).unwrap();
    let claims = tokens.verify_access_token(&pair.access_token).unwrap();

    assert_eq!(claims.sub, "user_1");
    assert_eq!(claims.email, "user_1@example.com");
    assert_eq!(claims.first_name, "Grace");
    assert_eq!(claims.last_name, "Hopper");
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.org_id.as_deref(), Some("org_a"));
    assert_eq!(claims.branch_id.as_deref(), Some("branch_x"));
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn test_tampered_access_token_is_rejected() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;

    let pair = tokens.issue_token_pair(&identity("user_1")).unwrap();
    let mut tampered = pair.access_token.clone();
    tampered.pop();

    assert!(tokens.verify_access_token(&tampered).is_err());
    assert!(tokens.verify_access_token("garbage").is_err());
}

#[tokio::test]
async fn test_rotation_consumes_the_parent_exactly_once() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;
    let ident = identity("user_1");

    let pair = tokens.issue_token_pair(&ident).unwrap();
    assert_eq!(
        tokens.validate_refresh_token(&pair.refresh_token).as_deref(),
        Some("user_1")
    );

    let rotated = tokens.rotate_refresh_token(&pair.refresh_token, &ident).unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    // No reuse of the parent.
    assert!(tokens.validate_refresh_token(&pair.refresh_token).is_none());
    assert!(tokens.rotate_refresh_token(&pair.refresh_token, &ident).is_err());
}

#[tokio::test]
async fn test_rotation_rejects_foreign_owner_without_burning_the_token() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;

    let pair = tokens.issue_token_pair(&identity("user_1")).unwrap();

    assert!(tokens
        .rotate_refresh_token(&pair.refresh_token, &identity("user_2"))
        .is_err());
    // Still redeemable by its real owner.
    assert_eq!(
        tokens.validate_refresh_token(&pair.refresh_token).as_deref(),
        Some("user_1")
    );
}

#[tokio::test]
async fn test_special_token_consume_is_single_use() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;

    let (token, expires_at) = tokens.issue_special_token(
        SpecialTokenKind::PasswordReset,
        Some("user_1".to_string()),
        "user_1@example.com".to_string(),
        None,
    );
    assert!(expires_at > chrono::Utc::now());

    // Peek any number of times.
    assert!(tokens
        .peek_special_token(&token, SpecialTokenKind::PasswordReset)
        .is_some());
    assert!(tokens
        .peek_special_token(&token, SpecialTokenKind::PasswordReset)
        .is_some());

    let payload = tokens
        .consume_special_token(&token, SpecialTokenKind::PasswordReset)
        .unwrap();
    assert_eq!(payload.user_id.as_deref(), Some("user_1"));

    assert!(tokens
        .consume_special_token(&token, SpecialTokenKind::PasswordReset)
        .is_none());
}

#[tokio::test]
async fn test_revoke_all_spans_both_collections() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;
    let ident = identity("user_1");

    let pair_a = tokens.issue_token_pair(&ident).unwrap();
    let pair_b = tokens.issue_token_pair(&ident).unwrap();
    let (special, _) = tokens.issue_special_token(
        SpecialTokenKind::EmailVerification,
        Some("user_1".to_string()),
        "user_1@example.com".to_string(),
        None,
    );
    let other = tokens.issue_token_pair(&identity("user_2")).unwrap();

    assert_eq!(tokens.revoke_all_for_user("user_1"), (2, 1));

    assert!(tokens.validate_refresh_token(&pair_a.refresh_token).is_none());
    assert!(tokens.validate_refresh_token(&pair_b.refresh_token).is_none());
    assert!(tokens
        .peek_special_token(&special, SpecialTokenKind::EmailVerification)
        .is_none());
    // Unrelated owner untouched.
    assert!(tokens.validate_refresh_token(&other.refresh_token).is_some());
}

#[tokio::test]
async fn test_sweep_leaves_live_tokens_alone() {
    let app = TestApp::spawn();
    let tokens = &app.state.tokens;

    let pair = tokens.issue_token_pair(&identity("user_1")).unwrap();
    let (special, _) = tokens.issue_special_token(
        SpecialTokenKind::Invitation,
        None,
        "invited@example.com".to_string(),
        None,
    );

    assert_eq!(tokens.sweep_expired(), (0, 0));
    assert!(tokens.validate_refresh_token(&pair.refresh_token).is_some());
    assert!(tokens
        .peek_special_token(&special, SpecialTokenKind::Invitation)
        .is_some());
}

#[tokio::test]
async fn test_concurrent_rotation_yields_at_most_one_child() {
    let app = TestApp::spawn();
    let tokens = app.state.tokens.clone();
    let ident = identity("user_1");

    let pair = tokens.issue_token_pair(&ident).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tokens = tokens.clone();
        let ident = ident.clone();
        let old = pair.refresh_token.clone();
        handles.push(tokio::spawn(async move {
            tokens.rotate_refresh_token(&old, &ident).is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}
