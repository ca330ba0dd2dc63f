//! Bearer token authorization.
//!
//! The manager decides whether a token is accepted (denylist first, then
//! signature and expiry). The gatekeeper middleware applies that decision to
//! every request outside the public whitelist.

mod bearer;
mod errors;
mod extractors;
mod gatekeeper;
mod manager;

pub use bearer::get_bearer;
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::Authorized;
pub use gatekeeper::{DEFAULT_PUBLIC_PATHS, GatekeeperState, Whitelist, require_authorization};
pub use manager::{AUDIT_TARGET, AuthorizedSubject, Rejection, TokenAuthorizationManager};
