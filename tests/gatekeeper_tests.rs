//! Tests for the request gatekeeper.
//!
//! Tests cover:
//! - Public paths pass through without a token
//! - Protected paths require an accepted bearer token
//! - Every refusal renders the same 401 body
//! - A denylist outage refuses requests

mod common;

use axum::http::StatusCode;
use common::{bearer, body_bytes, body_json, create_test_app, create_test_app_with_whitelist, get};
use std::time::Duration;
use tokenward::{auth::Whitelist, db::DenylistEntry, jwt::JwtConfig};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_is_public() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/api/whoami", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer"
    );
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Unauthorized" })
    );
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let test = create_test_app().await;
    let issued = test.tokens.issue("alice").unwrap();

    let response = test
        .app
        .oneshot(get("/api/whoami", Some(&bearer(&issued.token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["login"], "alice");
    assert_eq!(body["expires_at"], issued.expires_at);
}

#[tokio::test]
async fn test_raw_token_without_scheme_accepted() {
    let test = create_test_app().await;
    let issued = test.tokens.issue("alice").unwrap();

    let response = test
        .app
        .oneshot(get("/api/whoami", Some(&issued.token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_all_refusals_look_the_same() {
    let test = create_test_app().await;

    let missing = test
        .app
        .clone()
        .oneshot(get("/api/whoami", None))
        .await
        .unwrap();
    let missing_status = missing.status();
    let missing_body = body_bytes(missing).await;

    let blocked = test.tokens.issue("alice").unwrap();
    test.tokens.invalidate(&blocked.token).await.unwrap();

    let forged = JwtConfig::new(b"some-other-secret", common::TEST_TTL)
        .unwrap()
        .issue("alice")
        .unwrap();

    test.clock.rewind(common::TEST_TTL + Duration::from_secs(60));
    let expired = test.tokens.issue("alice").unwrap();
    test.clock.advance(common::TEST_TTL + Duration::from_secs(60));

    let candidates = [
        bearer(&blocked.token),
        bearer(&forged.token),
        bearer(&expired.token),
        bearer("not-a-jwt"),
        "Bearer ".to_string(),
    ];

    for authorization in candidates {
        let response = test
            .app
            .clone()
            .oneshot(get("/api/whoami", Some(&authorization)))
            .await
            .unwrap();

        assert_eq!(response.status(), missing_status);
        assert_eq!(body_bytes(response).await, missing_body);
    }
}

#[tokio::test]
async fn test_store_outage_fails_closed() {
    let test = create_test_app().await;
    let issued = test.tokens.issue("alice").unwrap();

    test.db.close().await;

    let response = test
        .app
        .clone()
        .oneshot(get("/api/whoami", Some(&bearer(&issued.token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Public paths do not touch the store
    let response = test.app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_custom_whitelist_replaces_defaults() {
    let test = create_test_app_with_whitelist(Whitelist::new(["/logout"])).await;

    let response = test
        .app
        .clone()
        .oneshot(get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let issued = test.tokens.issue("alice").unwrap();
    let response = test
        .app
        .oneshot(get("/health", Some(&bearer(&issued.token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_denylisted_garbage_rejected() {
    let test = create_test_app().await;
    test.db
        .denylist()
        .create(DenylistEntry::invalidated("garbage"))
        .await
        .unwrap();

    let response = test
        .app
        .oneshot(get("/api/whoami", Some("Bearer garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
