mod commands;
mod output;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use affiliation_lib::DashboardConfig;

use crate::output::OutputFormat;
use crate::store::{CliNavigator, SessionStore};

#[derive(Parser)]
#[command(name = "affiliation")]
#[command(about = "Browse affiliation sales and registration reports")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login(commands::login::LoginArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Fetch detail or summary reports
    Reports(Box<commands::reports::ReportsArgs>),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("affiliation=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    let config = DashboardConfig::load(cli.config.as_deref())?;
    let store = SessionStore::from_config(&config)?;
    let navigator = Arc::new(CliNavigator::new(store.path().to_path_buf()));
    let services = config.connect(navigator)?;

    if let Some(session) = store.load() {
        services.sessions.restore(session);
    }

    match &cli.command {
        Commands::Login(args) => commands::login::run(args, &services.sessions, &store).await?,
        Commands::Logout => commands::logout::run(&services.sessions, &store)?,
        Commands::Whoami => commands::whoami::run(&services.sessions, &format)?,
        Commands::Reports(args) => {
            commands::reports::run(args.as_ref(), services.reports.clone(), &format).await?
        }
    }

    Ok(())
}
