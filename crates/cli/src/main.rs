//! Inkdrop CLI - Database migrations and maintenance jobs.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! inkdrop migrate
//!
//! # Create admin user (password from --password or INKDROP_ADMIN_PASSWORD)
//! inkdrop admin create -e admin@example.com -n "Admin Name" -r super_admin
//!
//! # Delete carts past their expiry
//! inkdrop prune-carts
//!
//! # Pull the catalog from Printful
//! inkdrop sync-products
//!
//! # Roll up analytics for a day (yesterday by default)
//! inkdrop analytics rollup --date 2026-10-16
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "inkdrop")]
#[command(author, version, about = "Inkdrop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Delete expired carts
    PruneCarts,
    /// Import or refresh products from Printful
    SyncProducts,
    /// Analytics maintenance
    Analytics {
        #[command(subcommand)]
        action: AnalyticsAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Initial password
        #[arg(short, long, env = "INKDROP_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum AnalyticsAction {
    /// Aggregate one day of events into the daily summary
    Rollup {
        /// Day to roll up (YYYY-MM-DD), yesterday when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let pool = commands::connect().await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&pool, &email, &name, &role, password).await?;
            }
        },
        Commands::PruneCarts => {
            commands::maintenance::prune_carts(&pool).await?;
        }
        Commands::SyncProducts => commands::maintenance::sync_products(&pool).await?,
        Commands::Analytics { action } => match action {
            AnalyticsAction::Rollup { date } => {
                commands::maintenance::rollup_analytics(&pool, date).await?;
            }
        },
    }
    Ok(())
}
