// ABOUTME: Courtline server binary: loads configuration, opens the database and serves the REST API
// ABOUTME: Command-line flags override the port and database URL from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Courtline Server Binary
//!
//! Starts the tennis coaching booking API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use courtline_server::{
    auth::AuthManager,
    config::ServerConfig,
    database::Database,
    logging,
    resources::{Integrations, ServerResources},
    server::run_server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "courtline-server")]
#[command(about = "Courtline - tennis coaching booking API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

/// File behind a `sqlite:` URL, or `None` for in-memory databases
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init_from_env()?;
    info!("Starting Courtline server");
    info!("{}", config.summary());
    config.validate()?;

    if let Some(parent) = sqlite_file_path(&config.database.url)
        .as_deref()
        .and_then(std::path::Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    let database = Database::new(&config.database.url, config.database.max_connections).await?;
    info!("Database ready");

    let auth_manager = AuthManager::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.jwt_expiry_hours,
        config.auth.bcrypt_cost,
    );
    let integrations = Integrations::from_config(&config)?;
    info!(
        payment_gateway = integrations.payment_gateway.name(),
        email_sender = integrations.email_sender.name(),
        "Integrations configured"
    );

    let resources = Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(config),
        integrations,
    ));

    if let Err(e) = run_server(resources).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
