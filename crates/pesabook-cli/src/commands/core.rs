//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Database status summary
//! - `cmd_categories` - List categories

use std::path::Path;

use anyhow::{Context, Result};
use pesabook_core::db::Database;

/// User scope applied by all local CLI operations
pub(crate) const LOCAL_USER: &str = "local-dev";

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_str().context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    db.seed_default_categories(LOCAL_USER)
        .context("Failed to seed default categories")?;
    println!("   Seeded default categories");

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Submit a notification: pesabook submit \"<SMS text>\"");
    println!("  2. Start the API server: pesabook serve");

    Ok(())
}

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    println!("📊 Database status");
    println!("   ─────────────────────────────");
    println!("   Path: {}", db.path());
    println!(
        "   Encryption: {}",
        if db.is_encrypted()? { "enabled" } else { "disabled" }
    );
    println!("   Pending: {}", db.list_unconfirmed(LOCAL_USER)?.len());
    println!("   Transactions: {}", db.list_transactions(LOCAL_USER)?.len());
    println!("   Suppliers: {}", db.list_suppliers(LOCAL_USER)?.len());
    println!("   Items: {}", db.list_items(LOCAL_USER, None)?.len());
    println!("   Categories: {}", db.list_categories(LOCAL_USER)?.len());

    Ok(())
}

pub fn cmd_categories(db: &Database) -> Result<()> {
    let categories = db.list_categories(LOCAL_USER)?;
    if categories.is_empty() {
        println!("No categories yet. Run 'pesabook init' to seed the defaults.");
        return Ok(());
    }

    println!("📁 Categories");
    for category in categories {
        let kind = if category.is_business { "business" } else { "personal" };
        println!("   [{}] {} ({})", category.id, category.name, kind);
    }
    Ok(())
}
