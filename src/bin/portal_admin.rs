// ABOUTME: Account bootstrap utility for the portal
// ABOUTME: Creates the first admin and additional accounts directly in the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! Portal accounts can only be created by an admin through the API, so the
//! first admin comes from this tool.
//!
//! Usage:
//! ```bash
//! portal-admin create-admin --username admin --password changeme --name "Portal Admin"
//!
//! # Reset an existing admin's password and name
//! portal-admin create-admin --username admin --password newpass --force
//!
//! portal-admin create-user --username alice --password secret1 --name Alice --inactive
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use portal_core::models::{normalize_username, validate_password, validate_username, Role};
use portal_server::{
    config::{DatabaseUrl, ServerConfig},
    credentials::hash_password,
    database::{AccountUpdate, Database, NewAccount},
    logging::LoggingConfig,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "portal-admin",
    about = "Portal account bootstrap",
    long_about = "Create admin and standard accounts directly in the portal database."
)]
struct AdminArgs {
    #[command(subcommand)]
    command: AdminCommand,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Create an admin account, or reset one with --force
    CreateAdmin {
        /// Login handle
        #[arg(long)]
        username: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Display name
        #[arg(long, default_value = "Portal Admin")]
        name: String,

        /// Overwrite password, name and role if the handle exists
        #[arg(long)]
        force: bool,
    },

    /// Create a standard account
    CreateUser {
        /// Login handle
        #[arg(long)]
        username: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Create the account deactivated
        #[arg(long)]
        inactive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AdminArgs::parse();
    LoggingConfig::from_env().init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&url)?;
    }
    let database = Database::new(&config.database.url).await?;
    let cost = config.auth.bcrypt_cost;

    match args.command {
        AdminCommand::CreateAdmin {
            username,
            password,
            name,
            force,
        } => create_admin(&database, cost, &username, &password, name, force).await,
        AdminCommand::CreateUser {
            username,
            password,
            name,
            inactive,
        } => {
            let username = checked_credentials(&username, &password)?;
            let account = database
                .create_account(&NewAccount {
                    name,
                    username,
                    password_hash: hash_password(&password, cost).await?,
                    role: Role::Standard,
                    is_active: !inactive,
                    created_by: None,
                })
                .await?;
            info!(account_id = %account.id, username = %account.username, "Account created");
            println!("Created user '{}' ({})", account.username, account.id);
            Ok(())
        }
    }
}

fn checked_credentials(username: &str, password: &str) -> Result<String> {
    let username = normalize_username(username);
    validate_username(&username)?;
    validate_password(password)?;
    Ok(username)
}

async fn create_admin(
    database: &Database,
    cost: u32,
    username: &str,
    password: &str,
    name: String,
    force: bool,
) -> Result<()> {
    let username = checked_credentials(username, password)?;
    if !force && database.admin_exists().await? {
        bail!("An admin account already exists (use --force to add or reset one)");
    }
    let password_hash = hash_password(password, cost).await?;

    if let Some(existing) = database.get_account_by_username(&username).await? {
        if !force {
            bail!("Account '{username}' already exists (use --force to reset it)");
        }
        database
            .update_account(
                &existing.id,
                &AccountUpdate {
                    name: Some(name),
                    password_hash: Some(password_hash),
                    role: Some(Role::Admin),
                    is_active: Some(true),
                    ..AccountUpdate::default()
                },
            )
            .await?;
        info!(account_id = %existing.id, "Admin account reset");
        println!("Reset admin '{username}'");
        return Ok(());
    }

    let account = database
        .create_account(&NewAccount {
            name,
            username,
            password_hash,
            role: Role::Admin,
            is_active: true,
            created_by: None,
        })
        .await?;
    info!(account_id = %account.id, "Admin account created");
    println!("Created admin '{}' ({})", account.username, account.id);
    Ok(())
}
