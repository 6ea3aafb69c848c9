// ABOUTME: Portal server binary
// ABOUTME: Loads configuration, opens the database and serves the REST API until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Portal Server Binary
//!
//! Starts the portal REST API with configuration taken from the environment.

use anyhow::Result;
use clap::Parser;
use portal_server::{
    config::{DatabaseUrl, ServerConfig},
    database::Database,
    logging::LoggingConfig,
    resources::ServerResources,
    server::{shutdown_signal, PortalServer},
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "portal-server")]
#[command(about = "Aura device portal - REST API for accounts, downloads, devices and support")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&url)?;
    }

    info!("Starting portal server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    info!("Database ready");

    if !database.admin_exists().await? {
        warn!("No admin account exists; create one with `portal-admin create-admin`");
    }

    let resources = Arc::new(ServerResources::new(database, Arc::new(config))?);
    PortalServer::new(resources).run(shutdown_signal()).await
}
