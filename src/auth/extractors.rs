//! Axum extractors for authorized requests.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::ApiAuthError;
use super::manager::AuthorizedSubject;

/// The subject the gatekeeper accepted for this request.
///
/// Only available on routes behind [`require_authorization`](super::require_authorization).
/// On any other route extraction fails with the uniform 401.
pub struct Authorized(pub AuthorizedSubject);

impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizedSubject>()
            .cloned()
            .map(Authorized)
            .ok_or_else(ApiAuthError::not_authenticated)
    }
}
