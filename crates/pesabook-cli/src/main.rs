//! Pesabook CLI - Mobile-money expense tracker
//!
//! Usage:
//!   pesabook init                 Initialize database
//!   pesabook submit "SMS text"    Run a notification through the pipeline
//!   pesabook pending              Show the confirmation queue
//!   pesabook serve --port 3000    Start web server

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Parse { text } => commands::cmd_parse(&text),
        Commands::Submit { text, sender, line } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_submit(&db, &text, &sender, line.as_deref())
        }
        Commands::Pending => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_pending(&db)
        }
        Commands::Confirm {
            id,
            item,
            supplier,
            category,
            personal,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_confirm(&db, id, &item, &supplier, category, personal)
        }
        Commands::Dismiss { id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_dismiss(&db, id)
        }
        Commands::Suppliers => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_suppliers(&db)
        }
        Commands::Items { category } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_items(&db, category)
        }
        Commands::Categories => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_categories(&db)
        }
        Commands::Transactions => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_transactions(&db)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
    }
}
