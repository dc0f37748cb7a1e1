//! CLI command implementations

use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;

use crate::accounts;
use crate::cli::{error, info, print_user_table, success, warn, OutputFormat, RoleArg};
use crate::config::{self, Config};
use crate::store::{PgStore, Store};

/// Write a starter workhours.toml
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", config::loader::CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", config::loader::CONFIG_FILENAME));
    info("Set DATABASE_URL and JWT_SECRET, then run 'workhours migrate'");

    Ok(())
}

/// Start the API server
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Apply the schema to the configured database
pub async fn migrate() -> Result<()> {
    let config = load_config()?;
    open_store(&config).await?;

    success("Database schema is up to date");
    Ok(())
}

/// Create an account, prompting for the password when it was not given
pub async fn create_user(username: &str, role: RoleArg, password: Option<String>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let password = match password {
        Some(password) => password,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Password for {}", username))
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    };

    match accounts::create_account(
        &store,
        username,
        password,
        role.into(),
        config.auth.bcrypt_cost,
    )
    .await
    {
        Ok(user) => {
            success(&format!("Created {} account '{}'", user.role, user.username));
            Ok(())
        }
        Err(e) => {
            error(&format!("Failed to create account: {}", e));
            Err(e.into())
        }
    }
}

/// List accounts
pub async fn users(format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let users = store.list_users().await?;

    match format {
        OutputFormat::Table => print_user_table(&users),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&users)?),
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    config::load_config().map_err(|e| anyhow::anyhow!("{}", e))
}

/// Connect to the configured PostgreSQL database and apply the schema.
///
/// Account commands only make sense against a persistent database, so the
/// in-memory store is refused.
pub async fn open_store(config: &Config) -> Result<PgStore> {
    if config.database.is_memory() {
        bail!("DATABASE_URL is not set; this command needs a PostgreSQL database");
    }
    let store = PgStore::connect(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    store.migrate().await.context("Failed to apply schema")?;
    Ok(store)
}
