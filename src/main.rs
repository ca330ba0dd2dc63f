use clap::Parser;
use tokenward::cli::{
    Args, build_config, handle_issue_token, init_logging, load_jwt_secret, open_database,
};
use tokenward::{create_app, init_sweep, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let config = build_config(
        db,
        jwt_secret,
        args.token_ttl,
        args.sweep_interval,
        args.public_paths,
    );

    let tokens = config.token_service().unwrap_or_else(|e| {
        error!(error = %e, "Invalid token configuration");
        std::process::exit(1);
    });

    if let Some(login) = &args.issue_token {
        handle_issue_token(&tokens, login);
    }

    let _sweeper = init_sweep(&tokens, config.sweep_interval).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    if let Ok(local_addr) = listener.local_addr() {
        info!(address = %local_addr, "Listening");
    }

    let app = create_app(&tokens, config.whitelist());
    if let Err(e) = run_server(app, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
