mod error;
mod tokens;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::tokens::TokenService;

pub use error::{ApiError, ResultExt};

/// Create the API router.
pub fn create_api_router(tokens: TokenService) -> Router {
    let tokens_state = tokens::TokensState { tokens };

    Router::new()
        .route("/health", get(health))
        .merge(tokens::router(tokens_state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
