//! Bearer token signing and verification.
//!
//! Tokens are compact HS256 JWTs. The codec is stateless: every decision is a
//! function of the configured secret and the injected [`Clock`].

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default token lifetime: 30 minutes
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Longest accepted token lifetime in seconds. `iat + ttl` stays within u64
/// for any clock reading below `i64::MAX`.
pub const MAX_TOKEN_TTL_SECS: u64 = i64::MAX as u64;

/// Source of the current time in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<u64, JwtError>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<u64, JwtError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|_| JwtError::TimeError)
    }
}

/// Manually driven clock for tests and tooling.
#[derive(Debug, Default)]
pub struct FixedClock {
    secs: AtomicU64,
}

impl FixedClock {
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    /// A fixed clock starting at the current wall time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now().unwrap_or_default())
    }

    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    pub fn rewind(&self, by: Duration) {
        let by = by.as_secs();
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                Some(s.saturating_sub(by))
            });
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Result<u64, JwtError> {
        Ok(self.secs.load(Ordering::SeqCst))
    }
}

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user login)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// User login, duplicated from `sub` for older clients
    pub user: String,
}

/// Result of issuing a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Signing configuration: secret, lifetime and clock.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtConfig {
    /// Create a codec for the given secret using the wall clock.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, JwtError> {
        Self::with_clock(secret, ttl, Arc::new(SystemClock))
    }

    /// Create a codec with an explicit clock.
    ///
    /// The TTL is truncated to whole seconds and must lie between one second
    /// and [`MAX_TOKEN_TTL_SECS`], so that `exp > iat` holds for every issued
    /// token.
    pub fn with_clock(
        secret: &[u8],
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, JwtError> {
        if ttl.as_secs() == 0 || ttl.as_secs() > MAX_TOKEN_TTL_SECS {
            return Err(JwtError::InvalidTtl);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::from_secs(ttl.as_secs()),
            clock,
        })
    }

    /// Current time according to the codec's clock.
    pub fn now(&self) -> Result<u64, JwtError> {
        self.clock.now()
    }

    /// Sign a new token for `subject`.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, JwtError> {
        let now = self.clock.now()?;
        let duration = self.ttl.as_secs();
        let exp = now.checked_add(duration).ok_or(JwtError::InvalidTtl)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp,
            user: subject.to_string(),
        };

        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
                .map_err(JwtError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
            duration,
        })
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.inspect(token)?;
        if self.clock.now()? > claims.exp {
            return Err(JwtError::Expired);
        }
        Ok(claims)
    }

    /// Check the signature only. The expiry is returned, not enforced.
    pub fn inspect(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::from_decode)?;

        Ok(token_data.claims)
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("token signature does not match")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token lifetime is out of range")]
    InvalidTtl,
    #[error("system time error")]
    TimeError,
}

impl JwtError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::SignatureInvalid,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}
