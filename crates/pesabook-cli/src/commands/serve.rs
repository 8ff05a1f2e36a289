//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::{open_db, LOCAL_USER};

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Pesabook web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // Parse API keys from environment (comma-separated)
    let api_keys: Vec<String> = std::env::var("PESABOOK_API_KEYS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if api_keys.is_empty() {
        println!("   🔒 Authentication: required, but no keys configured");
        println!("      Set PESABOOK_API_KEYS to a comma-separated list of keys");
    } else {
        println!("   🔑 API keys: {} configured (PESABOOK_API_KEYS)", api_keys.len());
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    // Ensure the local user's category defaults exist (idempotent)
    db.seed_default_categories(LOCAL_USER)
        .context("Failed to seed default categories")?;

    let config = pesabook_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: vec![],
        api_keys,
    };

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    pesabook_server::serve_with_config(db, host, port, static_dir_str, config).await?;

    Ok(())
}
