mod common;

use common::{TestApp, ADMIN_TOKEN, USER_TOKEN};
use serde_json::json;

// =============================================================================
// Input validation
// =============================================================================

#[tokio::test]
async fn set_admin_role_rejects_missing_uid() {
    let app = TestApp::spawn().await;

    let response = app.call("setAdminRole", json!({}), Some(ADMIN_TOKEN)).await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
    assert_eq!(body["error"]["message"], "User ID is required");

    // The provider must not be called for an invalid request
    assert_eq!(app.identity.write_count(), 0);
}

#[tokio::test]
async fn set_admin_role_rejects_empty_uid() {
    let app = TestApp::spawn().await;

    let response = app
        .call("setAdminRole", json!({ "uid": "" }), Some(ADMIN_TOKEN))
        .await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
    assert_eq!(app.identity.write_count(), 0);
}

// =============================================================================
// Granting the role
// =============================================================================

#[tokio::test]
async fn set_admin_role_writes_claim_and_confirms() {
    let app = TestApp::spawn().await;

    let response = app
        .call("setAdminRole", json!({ "uid": "abc123" }), Some(ADMIN_TOKEN))
        .await;

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["result"]["message"],
        "✅ Admin role set for UID: abc123"
    );

    let writes = app
        .identity
        .claims_written
        .lock()
        .expect("Claim log poisoned");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "abc123");
    assert_eq!(writes[0].1.usertype, "admin");
}

#[tokio::test]
async fn set_admin_role_is_repeatable() {
    let app = TestApp::spawn().await;

    for _ in 0..2 {
        let response = app
            .call("setAdminRole", json!({ "uid": "abc123" }), Some(ADMIN_TOKEN))
            .await;
        assert!(response.status().is_success());
    }

    // Each grant reasserts the claim; nothing is deduplicated
    assert_eq!(app.identity.write_count(), 2);
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn set_admin_role_requires_a_bearer_token() {
    let app = TestApp::spawn().await;

    let response = app.call("setAdminRole", json!({ "uid": "abc123" }), None).await;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["status"], "UNAUTHENTICATED");
    assert_eq!(app.identity.write_count(), 0);
}

#[tokio::test]
async fn set_admin_role_rejects_unknown_tokens() {
    let app = TestApp::spawn().await;

    let response = app
        .call("setAdminRole", json!({ "uid": "abc123" }), Some("bogus"))
        .await;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["status"], "UNAUTHENTICATED");
    assert_eq!(app.identity.write_count(), 0);
}

#[tokio::test]
async fn set_admin_role_rejects_non_admin_callers() {
    let app = TestApp::spawn().await;

    let response = app
        .call("setAdminRole", json!({ "uid": "abc123" }), Some(USER_TOKEN))
        .await;

    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["status"], "PERMISSION_DENIED");
    assert_eq!(app.identity.write_count(), 0);
}

// =============================================================================
// Provider failures
// =============================================================================

#[tokio::test]
async fn set_admin_role_surfaces_provider_failures() {
    let app = TestApp::spawn().await;
    app.identity
        .fail_writes
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let response = app
        .call("setAdminRole", json!({ "uid": "abc123" }), Some(ADMIN_TOKEN))
        .await;

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"]["status"], "INTERNAL");

    // The write was attempted exactly once and nothing was recorded
    assert_eq!(app.identity.write_count(), 1);
    assert!(app
        .identity
        .claims_written
        .lock()
        .expect("Claim log poisoned")
        .is_empty());
}
