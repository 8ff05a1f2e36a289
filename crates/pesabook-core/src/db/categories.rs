//! Expense category operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Category;

/// Categories created for each new user on first contact
const DEFAULT_CATEGORIES: &[(&str, bool)] = &[
    ("Food Supplies", true),
    ("Beverages", true),
    ("Utilities", true),
    ("Rent", true),
    ("Staff", true),
    ("Equipment", true),
    ("Transport", true),
    ("Personal", false),
];

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        is_business: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

impl Database {
    /// Seed the default category set for a user. Idempotent: existing
    /// names are left untouched.
    pub fn seed_default_categories(&self, user_id: &str) -> Result<()> {
        let conn = self.conn()?;
        for (name, is_business) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (user_id, name, is_business) VALUES (?, ?, ?)
                 ON CONFLICT(user_id, name) DO NOTHING",
                params![user_id, name, is_business],
            )?;
        }
        Ok(())
    }

    pub fn create_category(&self, user_id: &str, name: &str, is_business: bool) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".to_string()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, is_business) VALUES (?, ?, ?)",
            params![user_id, name, is_business],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::InvalidData(format!("Category '{}' already exists", name))
            }
            other => Error::Database(other),
        })?;
        let id = conn.last_insert_rowid();

        self.get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Category {} vanished after insert", id)))
    }

    pub fn get_category(&self, user_id: &str, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, user_id, name, is_business, created_at
                 FROM categories WHERE user_id = ? AND id = ?",
                params![user_id, id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, is_business, created_at
             FROM categories WHERE user_id = ? ORDER BY name",
        )?;
        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }
}
