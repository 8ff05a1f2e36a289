//! Committed transaction operations
//!
//! Rows here are created by the confirmation workflow
//! (`Database::confirm_pending`); this module is the read side.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Transaction, TransactionDirection, TransactionStatus, TransactionType};

const TRANSACTION_COLUMNS: &str = "id, user_id, amount, direction, description, \
    counterparty_phone, category_id, transaction_type, reference_code, is_personal, status, \
    transaction_date, created_at";

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        direction: row
            .get::<_, String>(3)?
            .parse::<TransactionDirection>()
            .unwrap_or(TransactionDirection::Out),
        description: row.get(4)?,
        counterparty_phone: row.get(5)?,
        category_id: row.get(6)?,
        transaction_type: row
            .get::<_, String>(7)?
            .parse::<TransactionType>()
            .unwrap_or_default(),
        reference_code: row.get(8)?,
        is_personal: row.get(9)?,
        status: row
            .get::<_, String>(10)?
            .parse::<TransactionStatus>()
            .unwrap_or_default(),
        transaction_date: parse_datetime(&row.get::<_, String>(11)?),
        created_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

impl Database {
    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE user_id = ? AND id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![user_id, id],
                row_to_transaction,
            )
            .optional()?;
        Ok(row)
    }

    /// Committed transactions, newest first
    pub fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ?
             ORDER BY transaction_date DESC, id DESC",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id], row_to_transaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
