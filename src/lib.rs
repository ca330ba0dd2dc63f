pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod tokens;

use api::create_api_router;
use auth::{GatekeeperState, Whitelist, require_authorization};
use axum::{Router, middleware};
use cleanup::SweepHandle;
use db::Database;
use jwt::{JwtConfig, JwtError};
use std::sync::Arc;
use std::time::Duration;
use tokens::TokenService;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing and verifying tokens
    pub jwt_secret: Vec<u8>,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Interval between denylist sweeps
    pub sweep_interval: Duration,
    /// Paths reachable without a token. `None` uses the default whitelist
    pub public_paths: Option<Vec<String>>,
}

impl ServerConfig {
    /// Build the token service for this configuration.
    pub fn token_service(&self) -> Result<TokenService, JwtError> {
        let jwt = JwtConfig::new(&self.jwt_secret, self.token_ttl)?;
        Ok(TokenService::new(Arc::new(jwt), &self.db))
    }

    pub fn whitelist(&self) -> Whitelist {
        match &self.public_paths {
            Some(paths) => Whitelist::new(paths.iter().cloned()),
            None => Whitelist::default(),
        }
    }
}

/// Create the application router. Every route outside `whitelist` goes
/// through the gatekeeper.
pub fn create_app(tokens: &TokenService, whitelist: Whitelist) -> Router {
    let gatekeeper = GatekeeperState::new(tokens.clone(), whitelist);

    create_api_router(tokens.clone())
        .layer(middleware::from_fn_with_state(gatekeeper, require_authorization))
}

/// Run one sweep, then spawn the background scheduler.
/// Call this before starting the server.
pub async fn init_sweep(tokens: &TokenService, every: Duration) -> SweepHandle {
    cleanup::run_sweep(tokens).await;

    match tokens.denylist().count().await {
        Ok(count) => info!(entries = count, "Denylist loaded"),
        Err(e) => warn!(error = %e, "Failed to count denylist entries"),
    }

    cleanup::spawn_sweep_scheduler(tokens.clone(), every)
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_sweep` before this to sweep on startup.
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}
