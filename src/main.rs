use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workhours::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workhours=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => cli::commands::serve(host, port).await,
        Commands::Init => cli::commands::init().await,
        Commands::Migrate => cli::commands::migrate().await,
        Commands::CreateUser {
            username,
            role,
            password,
        } => cli::commands::create_user(&username, role, password).await,
        Commands::Users { format } => cli::commands::users(format).await,
    }
}
