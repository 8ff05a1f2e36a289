//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pesabook - Turn mobile-money SMS into a business ledger
#[derive(Parser)]
#[command(name = "pesabook")]
#[command(about = "Self-hosted mobile-money expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "pesabook.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set PESABOOK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Parse an SMS message without storing anything
    Parse {
        /// Message text to parse
        text: String,
    },

    /// Submit an SMS notification through the full pipeline
    Submit {
        /// Message text
        text: String,

        /// Sender short code or name
        #[arg(short, long, default_value = "MPESA")]
        sender: String,

        /// Device-reported line (SIM1 or SIM2)
        #[arg(short, long)]
        line: Option<String>,
    },

    /// List pending transactions awaiting confirmation
    Pending,

    /// Confirm a pending transaction
    Confirm {
        /// Pending transaction id
        id: i64,

        /// What was bought
        #[arg(short, long)]
        item: String,

        /// Who it was bought from
        #[arg(short, long)]
        supplier: String,

        /// Category id (see 'pesabook categories')
        #[arg(short, long)]
        category: i64,

        /// Mark as personal rather than business spend
        #[arg(long)]
        personal: bool,
    },

    /// Dismiss a pending transaction from the confirmation queue
    Dismiss {
        /// Pending transaction id
        id: i64,
    },

    /// List known suppliers
    Suppliers,

    /// List known items, optionally per category
    Items {
        /// Filter by category id
        #[arg(short, long)]
        category: Option<i64>,
    },

    /// List categories
    Categories,

    /// List committed transactions
    Transactions,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires an API key (PESABOOK_API_KEYS).
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show database status (encryption, size, counts)
    Status,
}
