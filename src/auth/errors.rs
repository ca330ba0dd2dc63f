//! Authentication error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::debug;

use super::manager::{AUDIT_TARGET, Rejection};

/// Why a request was turned away. Only used for logging; every kind renders
/// the same response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No usable `Authorization` header
    NotAuthenticated,
    Rejected(Rejection),
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::NotAuthenticated => "missing_token",
            AuthErrorKind::Rejected(rejection) => rejection.as_str(),
        }
    }
}

/// API authentication error (uniform JSON 401).
#[derive(Debug)]
pub struct ApiAuthError {
    kind: AuthErrorKind,
}

impl ApiAuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn not_authenticated() -> Self {
        Self::new(AuthErrorKind::NotAuthenticated)
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self::new(AuthErrorKind::Rejected(rejection))
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }
}

impl From<Rejection> for ApiAuthError {
    fn from(rejection: Rejection) -> Self {
        Self::rejected(rejection)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        debug!(target: AUDIT_TARGET, reason = self.kind.as_str(), "Request unauthorized");

        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized",
            }),
        )
            .into_response();

        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));

        response
    }
}
