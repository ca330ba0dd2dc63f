//! Authorization decisions for bearer tokens.
//!
//! A decision moves through two checks in a fixed order:
//!
//! 1. **Denylist**: a hit rejects with [`Rejection::TokenBlocked`]; a miss
//!    moves on to the signature check. Any other store error rejects with
//!    [`Rejection::AuthorizationUnavailable`]. An unreadable denylist never
//!    counts as "not blocked".
//! 2. **Signature**: signature and expiry are checked by the codec. Success
//!    accepts; each codec failure maps to its own rejection.
//!
//! The denylist comes first, so a logged-out token is refused even while its
//! signature and expiry are still valid. Nothing here writes or retries.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::{DenylistStore, StoreError};
use crate::jwt::{Claims, JwtConfig, JwtError};

/// Tracing target for rejection reasons. Reasons are never sent to clients.
pub const AUDIT_TARGET: &str = "tokenward::audit";

/// A token that passed both checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSubject {
    /// The token's subject (user login)
    pub login: String,
    pub claims: Claims,
}

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("token is on the denylist")]
    TokenBlocked,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("authorization is unavailable")]
    AuthorizationUnavailable,
}

impl Rejection {
    /// Short reason tag for audit logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::TokenBlocked => "blocked",
            Rejection::InvalidSignature => "invalid_signature",
            Rejection::Expired => "expired",
            Rejection::Malformed => "malformed",
            Rejection::AuthorizationUnavailable => "unavailable",
        }
    }
}

impl From<JwtError> for Rejection {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::SignatureInvalid => Rejection::InvalidSignature,
            JwtError::Expired => Rejection::Expired,
            JwtError::Malformed => Rejection::Malformed,
            JwtError::TimeError | JwtError::Encoding(_) | JwtError::InvalidTtl => {
                Rejection::AuthorizationUnavailable
            }
        }
    }
}

#[derive(Clone)]
pub struct TokenAuthorizationManager {
    jwt: Arc<JwtConfig>,
    denylist: DenylistStore,
}

impl TokenAuthorizationManager {
    pub fn new(jwt: Arc<JwtConfig>, denylist: DenylistStore) -> Self {
        Self { jwt, denylist }
    }

    /// Decide whether `token` is accepted.
    pub async fn authorize(&self, token: &str) -> Result<AuthorizedSubject, Rejection> {
        let decision = match self.check_denylist(token).await {
            Ok(()) => self.verify_signature(token),
            Err(rejection) => Err(rejection),
        };

        match &decision {
            Ok(subject) => {
                debug!(target: AUDIT_TARGET, login = %subject.login, "Token accepted")
            }
            Err(rejection) => {
                debug!(target: AUDIT_TARGET, reason = rejection.as_str(), "Token rejected")
            }
        }

        decision
    }

    async fn check_denylist(&self, token: &str) -> Result<(), Rejection> {
        match self.denylist.find_by_id(token).await {
            Ok(_) => Err(Rejection::TokenBlocked),
            Err(StoreError::NotFound) => Ok(()),
            Err(e) => {
                warn!(target: AUDIT_TARGET, error = %e, "Denylist lookup failed");
                Err(Rejection::AuthorizationUnavailable)
            }
        }
    }

    fn verify_signature(&self, token: &str) -> Result<AuthorizedSubject, Rejection> {
        let claims = self.jwt.verify(token)?;
        Ok(AuthorizedSubject {
            login: claims.sub.clone(),
            claims,
        })
    }
}
