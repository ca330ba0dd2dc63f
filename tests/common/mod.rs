#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tokenward::{
    auth::Whitelist,
    create_app,
    db::Database,
    jwt::{FixedClock, JwtConfig},
    tokens::TokenService,
};

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-at-least-32-bytes-long";
pub const TEST_TTL: Duration = Duration::from_secs(60 * 60);

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub tokens: TokenService,
    pub clock: Arc<FixedClock>,
}

/// App over an in-memory database with a manually driven clock.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_whitelist(Whitelist::default()).await
}

pub async fn create_test_app_with_whitelist(whitelist: Whitelist) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let clock = Arc::new(FixedClock::starting_now());
    let jwt = JwtConfig::with_clock(TEST_SECRET, TEST_TTL, clock.clone())
        .expect("Invalid test token config");
    let tokens = TokenService::new(Arc::new(jwt), &db);
    let app = create_app(&tokens, whitelist);

    TestApp {
        app,
        db,
        tokens,
        clock,
    }
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    request("GET", uri, authorization)
}

pub fn post(uri: &str, authorization: Option<&str>) -> Request<Body> {
    request("POST", uri, authorization)
}

fn request(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
