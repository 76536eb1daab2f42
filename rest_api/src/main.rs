// rest_api/src/main.rs

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rest_api::admin::{mint_token, seed_users};
use rest_api::config::load_rest_api_config;
use rest_api::start_server;

#[derive(Debug, Parser)]
#[command(name = "rest_api", about = "Prescriptions REST API server")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Port to listen on, overriding the configuration.
    #[arg(long)]
    port: Option<u16>,
    /// Add the users in this JSON file to the user directory, then exit.
    #[arg(long, value_name = "FILE")]
    seed_users: Option<PathBuf>,
    /// Print a bearer token for this user id, then exit.
    #[arg(long, value_name = "USER_ID", requires = "token_role")]
    token_user: Option<String>,
    /// Role carried by the token printed for --token-user.
    #[arg(long, value_name = "ROLE", requires = "token_user")]
    token_role: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = load_rest_api_config(args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(path) = args.seed_users {
        for user in seed_users(&config, &path).await? {
            println!("{} {} {}", user.id, user.role, user.email);
        }
        return Ok(());
    }
    if let (Some(user_id), Some(role)) = (args.token_user, args.token_role) {
        println!("{}", mint_token(&config, &user_id, &role)?);
        return Ok(());
    }

    info!("Starting prescriptions REST API with {} storage", config.storage.storage_engine_type);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Received shutdown signal.");
    };

    start_server(config, shutdown).await
}
