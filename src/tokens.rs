//! Token lifecycle: issue, authorize, invalidate, sweep.

use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{AuthorizedSubject, Rejection, TokenAuthorizationManager};
use crate::db::{Database, DenylistEntry, DenylistStore, StoreError};
use crate::jwt::{IssuedToken, JwtConfig, JwtError};

#[derive(Debug, thiserror::Error)]
pub enum TokenServiceError {
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Facade over the codec, the denylist and the authorization manager.
#[derive(Clone)]
pub struct TokenService {
    jwt: Arc<JwtConfig>,
    denylist: DenylistStore,
    manager: TokenAuthorizationManager,
}

impl TokenService {
    pub fn new(jwt: Arc<JwtConfig>, db: &Database) -> Self {
        let denylist = db.denylist();
        let manager = TokenAuthorizationManager::new(jwt.clone(), denylist.clone());
        Self {
            jwt,
            denylist,
            manager,
        }
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    pub fn denylist(&self) -> &DenylistStore {
        &self.denylist
    }

    /// Sign a new token for `login`.
    pub fn issue(&self, login: &str) -> Result<IssuedToken, TokenServiceError> {
        let issued = self.jwt.issue(login)?;
        debug!(login = %login, expires_at = issued.expires_at, "Issued token");
        Ok(issued)
    }

    pub async fn authorize(&self, token: &str) -> Result<AuthorizedSubject, Rejection> {
        self.manager.authorize(token).await
    }

    /// Put `token` on the denylist.
    pub async fn invalidate(&self, token: &str) -> Result<(), TokenServiceError> {
        self.denylist
            .create(DenylistEntry::invalidated(token))
            .await?;
        Ok(())
    }

    /// Remove denylist entries whose own expiry has passed.
    ///
    /// An entry goes only when its signature verifies and its embedded `exp`
    /// is before the current time. Entries that fail the signature check are
    /// kept. Returns the number of entries this call removed.
    pub async fn sweep(&self) -> Result<u64, TokenServiceError> {
        let now = self.jwt.now()?;
        let mut removed = 0;

        for entry in self.denylist.find_all().await? {
            if self.prune(entry, now).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Delete `entry` if its token expired before `now`.
    ///
    /// Returns whether this call removed the row. An entry that is already
    /// gone, e.g. removed by an overlapping sweep, counts as not removed.
    async fn prune(&self, entry: DenylistEntry, now: u64) -> Result<bool, TokenServiceError> {
        let exp = match self.jwt.inspect(&entry.id) {
            Ok(claims) => claims.exp,
            Err(e) => {
                debug!(reason = %e, "Keeping denylist entry that fails verification");
                return Ok(false);
            }
        };

        if now <= exp {
            return Ok(false);
        }

        match self.denylist.delete(entry).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Take `token` off the denylist.
    pub async fn unblock(&self, token: &str) -> Result<DenylistEntry, TokenServiceError> {
        let entry = self
            .denylist
            .delete(DenylistEntry::invalidated(token))
            .await?;
        info!("Removed token from denylist");
        Ok(entry)
    }
}
