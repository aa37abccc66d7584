use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marketplace_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    events, openapi,
    services::users::UserService,
};

/// Operator tooling for the marketplace API
#[derive(Debug, Parser)]
#[command(name = "marketplace-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create an admin account, or promote an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Administrator")]
        name: String,
    },
    /// Write the OpenAPI document as JSON
    Openapi {
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Openapi { output } => export_openapi(output)?,
        Commands::Migrate => {
            let (_, pool) = connect().await?;
            db::run_migrations(&pool).await?;
            println!("Migrations applied");
        }
        Commands::CreateAdmin {
            email,
            password,
            name,
        } => {
            let (cfg, pool) = connect().await?;
            db::run_migrations(&pool).await?;
            let (sender, rx) = events::channel(cfg.event_channel_capacity);
            tokio::spawn(events::process_events(rx));

            let users = UserService::new(Arc::new(pool), Arc::new(sender));
            let (admin, created) = users.ensure_admin(&email, &name, &password).await?;
            if created {
                println!("Created admin {} ({})", admin.email, admin.id);
            } else {
                println!("Promoted {} ({}) to admin", admin.email, admin.id);
            }
        }
    }

    Ok(())
}

async fn connect() -> Result<(AppConfig, DbPool)> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    Ok((cfg, pool))
}

fn export_openapi(output: Option<PathBuf>) -> Result<()> {
    let json = openapi::openapi_json()?;
    match output {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("OpenAPI document written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
