//! Request gatekeeper: every non-public path needs an accepted bearer token.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::bearer::get_bearer;
use super::errors::ApiAuthError;
use crate::tokens::TokenService;

/// Paths public by default.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/health", "/logout"];

/// Paths that skip authorization. Matched exactly against the request path.
#[derive(Debug, Clone)]
pub struct Whitelist {
    paths: HashSet<String>,
}

impl Whitelist {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PATHS.iter().copied())
    }
}

#[derive(Clone)]
pub struct GatekeeperState {
    pub tokens: TokenService,
    pub whitelist: Arc<Whitelist>,
}

impl GatekeeperState {
    pub fn new(tokens: TokenService, whitelist: Whitelist) -> Self {
        Self {
            tokens,
            whitelist: Arc::new(whitelist),
        }
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`.
///
/// Accepted requests carry the [`AuthorizedSubject`](super::AuthorizedSubject)
/// in their extensions. Every refusal gets the same 401.
pub async fn require_authorization(
    State(state): State<GatekeeperState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.whitelist.contains(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(token) = get_bearer(request.headers()).map(str::to_string) else {
        return ApiAuthError::not_authenticated().into_response();
    };

    match state.tokens.authorize(&token).await {
        Ok(subject) => {
            request.extensions_mut().insert(subject);
            next.run(request).await
        }
        Err(rejection) => ApiAuthError::rejected(rejection).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_whitelist() {
        let whitelist = Whitelist::default();
        assert!(whitelist.contains("/health"));
        assert!(whitelist.contains("/logout"));
        assert!(!whitelist.contains("/api/whoami"));
    }

    #[test]
    fn test_whitelist_exact_match() {
        let whitelist = Whitelist::new(["/status", "/metrics"]);
        assert!(whitelist.contains("/status"));
        assert!(whitelist.contains("/metrics"));
        assert!(!whitelist.contains("/status/"));
        assert!(!whitelist.contains("/health"));
    }
}
