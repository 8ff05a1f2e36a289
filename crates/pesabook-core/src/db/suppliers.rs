//! Supplier memory operations
//!
//! Suppliers are learned from confirmations, keyed by phone number per
//! user. `common_items` keeps a recency-ordered, bounded list of item
//! names so the confirmation form can suggest what was bought before.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Supplier;

/// Upper bound on remembered item names per supplier
const MAX_COMMON_ITEMS: usize = 10;

const SUPPLIER_COLUMNS: &str = "id, user_id, name, phone, common_items, default_category_id, \
    is_personal, total_transactions, last_transaction_date, created_at, updated_at";

fn row_to_supplier(row: &Row) -> rusqlite::Result<Supplier> {
    let common_items_json: String = row.get(4)?;
    Ok(Supplier {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        common_items: serde_json::from_str(&common_items_json).unwrap_or_default(),
        default_category_id: row.get(5)?,
        is_personal: row.get(6)?,
        total_transactions: row.get(7)?,
        last_transaction_date: row
            .get::<_, Option<String>>(8)?
            .map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

impl Database {
    pub fn get_supplier_by_phone(&self, user_id: &str, phone: &str) -> Result<Option<Supplier>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM suppliers WHERE user_id = ? AND phone = ?",
                    SUPPLIER_COLUMNS
                ),
                params![user_id, phone],
                row_to_supplier,
            )
            .optional()?;
        Ok(row)
    }

    /// Suppliers by recency of last purchase
    pub fn list_suppliers(&self, user_id: &str) -> Result<Vec<Supplier>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM suppliers WHERE user_id = ?
             ORDER BY last_transaction_date DESC, name",
            SUPPLIER_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id], row_to_supplier)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Record one confirmed purchase against a supplier, creating the
    /// supplier on first contact.
    ///
    /// Existing suppliers get the item pushed to the front of
    /// `common_items` (deduplicated, bounded), counters bumped and
    /// `last_transaction_date` stamped.
    pub fn record_supplier_purchase(
        &self,
        user_id: &str,
        name: &str,
        phone: &str,
        item_name: &str,
        category_id: i64,
        is_personal: bool,
        now: DateTime<Utc>,
    ) -> Result<Supplier> {
        let now_str = format_datetime(now);
        let conn = self.conn()?;

        match self.get_supplier_by_phone(user_id, phone)? {
            Some(existing) => {
                let mut items = existing.common_items;
                items.retain(|i| !i.eq_ignore_ascii_case(item_name));
                items.insert(0, item_name.to_string());
                items.truncate(MAX_COMMON_ITEMS);

                conn.execute(
                    "UPDATE suppliers
                     SET common_items = ?, total_transactions = total_transactions + 1,
                         last_transaction_date = ?, updated_at = ?
                     WHERE user_id = ? AND phone = ?",
                    params![
                        serde_json::to_string(&items)?,
                        now_str,
                        now_str,
                        user_id,
                        phone
                    ],
                )?;
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO suppliers
                        (user_id, name, phone, common_items, default_category_id, is_personal,
                         total_transactions, last_transaction_date)
                    VALUES (?, ?, ?, ?, ?, ?, 1, ?)
                    "#,
                    params![
                        user_id,
                        name,
                        phone,
                        serde_json::to_string(&vec![item_name.to_string()])?,
                        category_id,
                        is_personal,
                        now_str,
                    ],
                )?;
            }
        }

        self.get_supplier_by_phone(user_id, phone)?
            .ok_or_else(|| Error::NotFound(format!("Supplier {} vanished after upsert", phone)))
    }
}
