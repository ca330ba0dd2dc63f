//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::MAX_TOKEN_TTL_SECS;
use crate::tokens::TokenService;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tokenward",
    about = "Bearer token gatekeeper with a persistent logout denylist"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7291")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tokenward.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL", default_value = "1800",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_SECS))]
    pub token_ttl: u64,

    /// Seconds between denylist sweeps
    #[arg(long, env = "SWEEP_INTERVAL", default_value = "3600",
        value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,

    /// Path reachable without a token. Repeat to add more; replaces the defaults (/health, /logout)
    #[arg(long = "public-path", value_parser = validate_public_path)]
    pub public_paths: Vec<String>,

    /// Issue a token for this login on startup and print it
    #[arg(long, value_name = "LOGIN")]
    pub issue_token: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_public_path(s: &str) -> Result<String, String> {
    if !s.starts_with('/') {
        return Err(format!("Public path must start with '/': {}", s));
    }

    if s.chars().any(|c| !c.is_ascii() || c.is_whitespace()) {
        return Err(format!("Public path contains invalid characters: {}", s));
    }

    Ok(s.to_string())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Handle the --issue-token flag: sign a token for `login` and print it.
pub fn handle_issue_token(tokens: &TokenService, login: &str) {
    match tokens.issue(login) {
        Ok(issued) => {
            println!();
            println!("Token for {} (expires at {}):", login, issued.expires_at);
            println!("{}", issued.token);
            println!();
        }
        Err(e) => {
            error!(login = %login, error = %e, "Failed to issue token");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    token_ttl: u64,
    sweep_interval: u64,
    public_paths: Vec<String>,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        token_ttl: Duration::from_secs(token_ttl),
        sweep_interval: Duration::from_secs(sweep_interval),
        public_paths: if public_paths.is_empty() {
            None
        } else {
            Some(public_paths)
        },
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tokenward"]).unwrap();
        assert_eq!(args.port, 7291);
        assert_eq!(args.database, "tokenward.db");
        assert!(args.public_paths.is_empty());
        assert!(args.issue_token.is_none());
    }

    #[test]
    fn test_zero_durations_rejected() {
        assert!(Args::try_parse_from(["tokenward", "--token-ttl", "0"]).is_err());
        assert!(Args::try_parse_from(["tokenward", "--sweep-interval", "0"]).is_err());
    }

    #[test]
    fn test_oversized_token_ttl_rejected() {
        assert!(
            Args::try_parse_from(["tokenward", "--token-ttl", "18446744073709551615"]).is_err()
        );

        let max = MAX_TOKEN_TTL_SECS.to_string();
        let args = Args::try_parse_from(["tokenward", "--token-ttl", max.as_str()]).unwrap();
        assert_eq!(args.token_ttl, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_public_paths_repeat() {
        let args = Args::try_parse_from([
            "tokenward",
            "--public-path",
            "/health",
            "--public-path",
            "/status",
        ])
        .unwrap();
        assert_eq!(args.public_paths, vec!["/health", "/status"]);
    }

    #[test]
    fn test_validate_public_path() {
        assert!(validate_public_path("/health").is_ok());
        assert!(validate_public_path("health").is_err());
        assert!(validate_public_path("/he alth").is_err());
    }
}
