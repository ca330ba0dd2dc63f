//! Token endpoints.
//!
//! - POST `/logout` - Put the caller's bearer token on the denylist
//! - GET `/api/whoami` - Login of the authorized caller

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tracing::info;

use super::error::{ApiError, ResultExt};
use crate::auth::{ApiAuthError, Authorized, get_bearer};
use crate::db::StoreError;
use crate::tokens::{TokenService, TokenServiceError};

#[derive(Clone)]
pub struct TokensState {
    pub tokens: TokenService,
}

pub fn router(state: TokensState) -> Router {
    Router::new()
        .route("/logout", post(logout))
        .route("/api/whoami", get(whoami))
        .with_state(state)
}

/// Invalidate the presented token.
///
/// The token must be accepted by `authorize` first, so arbitrary strings
/// never reach the denylist and a second logout gets the same 401 as any
/// other rejected token.
async fn logout(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = get_bearer(&headers).ok_or_else(ApiAuthError::not_authenticated)?;
    let subject = state
        .tokens
        .authorize(token)
        .await
        .map_err(ApiAuthError::rejected)?;

    match state.tokens.invalidate(token).await {
        // A concurrent logout with the same token got there first
        Err(TokenServiceError::Store(StoreError::Duplicate)) => {}
        result => result.db_err("Failed to invalidate token")?,
    }

    info!(login = %subject.login, "Logged out");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "success": true })),
    ))
}

#[derive(Serialize)]
struct WhoAmIResponse {
    login: String,
    expires_at: u64,
}

async fn whoami(Authorized(subject): Authorized) -> impl IntoResponse {
    Json(WhoAmIResponse {
        login: subject.login,
        expires_at: subject.claims.exp,
    })
}
