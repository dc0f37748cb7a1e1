//! CLI interface for workhours

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "workhours")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Track work hours, vacations and expenses", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Write a starter workhours.toml in the current directory
    Init,

    /// Create the database tables if they do not exist
    Migrate,

    /// Create an account
    CreateUser {
        /// Login name for the new account
        username: String,

        /// Account role
        #[arg(short, long, default_value = "employee")]
        role: RoleArg,

        /// Password (prompted for when omitted)
        #[arg(long, env = "WORKHOURS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// List accounts
    Users {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Employee,
    Manager,
}

impl From<RoleArg> for crate::auth::UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Employee => Self::Employee,
            RoleArg::Manager => Self::Manager,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
