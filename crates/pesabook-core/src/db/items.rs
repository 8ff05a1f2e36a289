//! Item memory operations
//!
//! Item names are matched case-insensitively; prices carry a running
//! arithmetic mean over every confirmed purchase.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Item;

const ITEM_COLUMNS: &str = "id, user_id, name, category_id, avg_price, last_price, \
    purchase_count, is_personal, created_at, updated_at";

fn row_to_item(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category_id: row.get(3)?,
        avg_price: row.get(4)?,
        last_price: row.get(5)?,
        purchase_count: row.get(6)?,
        is_personal: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

impl Database {
    pub fn get_item_by_name(&self, user_id: &str, name: &str) -> Result<Option<Item>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM items WHERE user_id = ? AND name = ? COLLATE NOCASE",
                    ITEM_COLUMNS
                ),
                params![user_id, name],
                row_to_item,
            )
            .optional()?;
        Ok(row)
    }

    /// Items, optionally filtered to one category
    pub fn list_items(&self, user_id: &str, category_id: Option<i64>) -> Result<Vec<Item>> {
        let conn = self.conn()?;
        let rows = match category_id {
            Some(category_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items WHERE user_id = ? AND category_id = ? ORDER BY name",
                    ITEM_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![user_id, category_id], row_to_item)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items WHERE user_id = ? ORDER BY name",
                    ITEM_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![user_id], row_to_item)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    /// Record one confirmed purchase of an item, creating it on first
    /// sight. Recomputes `avg_price` as the running mean over all
    /// purchases; name matching is case-insensitive.
    pub fn record_item_purchase(
        &self,
        user_id: &str,
        name: &str,
        price: f64,
        category_id: i64,
        is_personal: bool,
        now: DateTime<Utc>,
    ) -> Result<Item> {
        let conn = self.conn()?;

        match self.get_item_by_name(user_id, name)? {
            Some(existing) => {
                let count = existing.purchase_count as f64;
                let avg_price = (existing.avg_price * count + price) / (count + 1.0);

                conn.execute(
                    "UPDATE items
                     SET avg_price = ?, last_price = ?, purchase_count = purchase_count + 1,
                         updated_at = ?
                     WHERE user_id = ? AND id = ?",
                    params![avg_price, price, format_datetime(now), user_id, existing.id],
                )?;

                self.get_item_by_name(user_id, name)?.ok_or_else(|| {
                    Error::NotFound(format!("Item {} vanished after update", name))
                })
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO items
                        (user_id, name, category_id, avg_price, last_price, purchase_count,
                         is_personal)
                    VALUES (?, ?, ?, ?, ?, 1, ?)
                    "#,
                    params![user_id, name, category_id, price, price, is_personal],
                )?;

                self.get_item_by_name(user_id, name)?.ok_or_else(|| {
                    Error::NotFound(format!("Item {} vanished after insert", name))
                })
            }
        }
    }
}
