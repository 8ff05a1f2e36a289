//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - Expense categories and default seeding
//! - `pending` - Pending-extraction store with reference-code dedup
//! - `transactions` - Committed transaction operations
//! - `suppliers` - Supplier memory learned from confirmations
//! - `items` - Item memory with running price statistics

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod categories;
mod items;
mod pending;
mod suppliers;
mod transactions;

pub use pending::PendingInsertResult;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "PESABOOK_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"pesabook-salt-v1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    // Extract the hash portion for use as SQLCipher key (hex encoded)
    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a DateTime<Utc> the way SQLite's CURRENT_TIMESTAMP does
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `PESABOOK_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `PESABOOK_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing. For production, use `new()` with `PESABOOK_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let key_pragma = passphrase
            .map(derive_key)
            .transpose()?
            .map(|key| format!("PRAGMA key = 'x\"{}\"';", key));

        // Connection-scoped pragmas must run on every pooled connection,
        // not just the one that happens to run migrations. The key pragma
        // has to come first on encrypted databases. busy_timeout makes a
        // second writer wait for the lock instead of failing with
        // SQLITE_BUSY, which the idempotent confirm/submit paths rely on.
        let manager = manager.with_init(move |conn| {
            if let Some(pragma) = &key_pragma {
                conn.execute_batch(pragma)?;
            }
            conn.execute_batch(
                "PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA cache_size = 2000;
                 PRAGMA temp_store = MEMORY;",
            )?;
            Ok(())
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/pesabook_test_{}.db", id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode persists in the database file, so it only needs to
            -- be set once here. Connection-scoped pragmas live in the pool
            -- initializer instead.
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Expense categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                is_business BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);

            -- Pending transactions (extractions awaiting confirmation).
            -- UNIQUE(user_id, reference_code) is the sole ingestion
            -- concurrency guard: racing submissions of the same vendor
            -- reference collapse to one row at the store level.
            CREATE TABLE IF NOT EXISTS pending_transactions (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                line_id TEXT NOT NULL DEFAULT 'SIM1',
                account_type TEXT NOT NULL DEFAULT 'business',
                line_rule TEXT,                            -- heuristic that chose line_id
                account_rule TEXT,                         -- heuristic that chose account_type
                amount REAL NOT NULL,
                counterparty_phone TEXT,
                counterparty_name TEXT,
                reference_code TEXT NOT NULL,
                resulting_balance REAL,
                direction TEXT NOT NULL DEFAULT 'UNKNOWN',
                is_confirmed BOOLEAN NOT NULL DEFAULT 0,
                transaction_id INTEGER REFERENCES transactions(id),
                item_name TEXT,
                supplier_name TEXT,
                dismissed_at DATETIME,                     -- hidden from the queue, never deleted
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, reference_code)
            );

            CREATE INDEX IF NOT EXISTS idx_pending_user_unconfirmed
                ON pending_transactions(user_id, is_confirmed);

            -- Committed transactions, created exactly once per confirmation
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                amount REAL NOT NULL,
                direction TEXT NOT NULL,                   -- IN, OUT
                description TEXT NOT NULL,
                counterparty_phone TEXT,
                category_id INTEGER REFERENCES categories(id),
                transaction_type TEXT NOT NULL DEFAULT 'MPESA',
                reference_code TEXT,
                is_personal BOOLEAN NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'COMPLETED',
                transaction_date DATETIME NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

            -- Suppliers (counterparty memory learned from confirmations)
            CREATE TABLE IF NOT EXISTS suppliers (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                common_items TEXT NOT NULL DEFAULT '[]',   -- JSON array, recency ordered
                default_category_id INTEGER REFERENCES categories(id),
                is_personal BOOLEAN NOT NULL DEFAULT 0,
                total_transactions INTEGER NOT NULL DEFAULT 0,
                last_transaction_date DATETIME,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, phone)
            );

            CREATE INDEX IF NOT EXISTS idx_suppliers_user ON suppliers(user_id);

            -- Items (purchase memory with running price statistics)
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                avg_price REAL NOT NULL DEFAULT 0,
                last_price REAL NOT NULL DEFAULT 0,
                purchase_count INTEGER NOT NULL DEFAULT 0,
                is_personal BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name COLLATE NOCASE)
            );

            CREATE INDEX IF NOT EXISTS idx_items_user ON items(user_id);
            CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
