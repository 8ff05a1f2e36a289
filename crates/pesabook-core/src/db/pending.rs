//! Pending-extraction store with reference-code deduplication

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    AccountType, ConfirmRequest, Direction, LineId, NewPendingTransaction, PendingTransaction,
    Transaction, TransactionDirection, TransactionStatus, TransactionType,
};

/// Result of inserting a pending transaction
#[derive(Debug, Clone)]
pub enum PendingInsertResult {
    /// Extraction was stored, contains the new row
    Inserted(PendingTransaction),
    /// Reference code already known for this user, contains the existing row
    Duplicate(PendingTransaction),
}

const PENDING_COLUMNS: &str = "id, user_id, raw_text, sender_id, line_id, account_type, \
    line_rule, account_rule, amount, counterparty_phone, counterparty_name, reference_code, \
    resulting_balance, direction, is_confirmed, transaction_id, item_name, supplier_name, \
    dismissed_at, created_at";

fn row_to_pending(row: &Row) -> rusqlite::Result<PendingTransaction> {
    Ok(PendingTransaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        raw_text: row.get(2)?,
        sender_id: row.get(3)?,
        line_id: row
            .get::<_, String>(4)?
            .parse::<LineId>()
            .unwrap_or(LineId::LineA),
        account_type: row
            .get::<_, String>(5)?
            .parse::<AccountType>()
            .unwrap_or(AccountType::Business),
        line_rule: row.get(6)?,
        account_rule: row.get(7)?,
        amount: row.get(8)?,
        counterparty_phone: row.get(9)?,
        counterparty_name: row.get(10)?,
        reference_code: row.get(11)?,
        balance: row.get(12)?,
        direction: row
            .get::<_, String>(13)?
            .parse::<Direction>()
            .unwrap_or(Direction::Unknown),
        is_confirmed: row.get(14)?,
        transaction_id: row.get(15)?,
        item_name: row.get(16)?,
        supplier_name: row.get(17)?,
        dismissed_at: row
            .get::<_, Option<String>>(18)?
            .map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&row.get::<_, String>(19)?),
    })
}

impl Database {
    /// Store an extraction, deduplicating on (user, reference code).
    ///
    /// Uses `ON CONFLICT DO NOTHING` plus a follow-up select rather than
    /// check-then-insert, so two racing submissions of the same reference
    /// still collapse to a single row.
    pub fn insert_pending(
        &self,
        user_id: &str,
        new: &NewPendingTransaction,
    ) -> Result<PendingInsertResult> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            INSERT INTO pending_transactions
                (user_id, raw_text, sender_id, line_id, account_type, line_rule, account_rule,
                 amount, counterparty_phone, counterparty_name, reference_code,
                 resulting_balance, direction)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, reference_code) DO NOTHING
            "#,
            params![
                user_id,
                new.raw_text,
                new.sender_id,
                new.line_id.as_str(),
                new.account_type.as_str(),
                new.line_rule,
                new.account_rule,
                new.amount,
                new.counterparty_phone,
                new.counterparty_name,
                new.reference_code,
                new.balance,
                new.direction.as_str(),
            ],
        )?;

        if changed == 0 {
            let existing = self
                .get_pending_by_reference(user_id, &new.reference_code)?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "Duplicate reference {} has no stored row",
                        new.reference_code
                    ))
                })?;
            return Ok(PendingInsertResult::Duplicate(existing));
        }

        let id = conn.last_insert_rowid();
        let row = self
            .get_pending(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Pending {} vanished after insert", id)))?;
        Ok(PendingInsertResult::Inserted(row))
    }

    pub fn get_pending(&self, user_id: &str, id: i64) -> Result<Option<PendingTransaction>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pending_transactions WHERE user_id = ? AND id = ?",
                    PENDING_COLUMNS
                ),
                params![user_id, id],
                row_to_pending,
            )
            .optional()?;
        Ok(row)
    }

    pub fn get_pending_by_reference(
        &self,
        user_id: &str,
        reference_code: &str,
    ) -> Result<Option<PendingTransaction>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pending_transactions WHERE user_id = ? AND reference_code = ?",
                    PENDING_COLUMNS
                ),
                params![user_id, reference_code],
                row_to_pending,
            )
            .optional()?;
        Ok(row)
    }

    /// Unconfirmed, undismissed extractions, newest first
    pub fn list_unconfirmed(&self, user_id: &str) -> Result<Vec<PendingTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pending_transactions
             WHERE user_id = ? AND is_confirmed = 0 AND dismissed_at IS NULL
             ORDER BY created_at DESC, id DESC",
            PENDING_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id], row_to_pending)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Hide a pending row from the confirmation queue.
    ///
    /// The row is stamped, never deleted; a dismissed row can still be
    /// confirmed later.
    pub fn dismiss_pending(
        &self,
        user_id: &str,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<PendingTransaction> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE pending_transactions SET dismissed_at = ?
             WHERE user_id = ? AND id = ? AND dismissed_at IS NULL",
            params![format_datetime(now), user_id, id],
        )?;

        let row = self
            .get_pending(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Pending transaction {} not found", id)))?;

        if changed == 0 && row.dismissed_at.is_none() {
            // No-op update against a live row should not happen
            return Err(Error::InvalidData(format!(
                "Pending transaction {} could not be dismissed",
                id
            )));
        }
        Ok(row)
    }

    /// Promote a pending row to a committed transaction.
    ///
    /// The whole primary write runs in one SQL transaction. The
    /// `is_confirmed = 0` guard makes confirmation idempotent: the loser
    /// of a race (or a retry) finds zero rows changed and gets the
    /// already-created Transaction back. Returns the transaction and
    /// whether this call created it.
    pub fn confirm_pending(
        &self,
        user_id: &str,
        id: i64,
        req: &ConfirmRequest,
        description: &str,
    ) -> Result<(Transaction, bool)> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE pending_transactions
             SET is_confirmed = 1, item_name = ?, supplier_name = ?
             WHERE user_id = ? AND id = ? AND is_confirmed = 0",
            params![req.item_name, req.supplier_name, user_id, id],
        )?;

        if changed == 0 {
            // Already confirmed (or missing). Hand back the existing
            // transaction so retries are harmless.
            let existing_tx_id: Option<Option<i64>> = tx
                .query_row(
                    "SELECT transaction_id FROM pending_transactions
                     WHERE user_id = ? AND id = ?",
                    params![user_id, id],
                    |row| row.get(0),
                )
                .optional()?;

            let tx_id = match existing_tx_id {
                Some(Some(tx_id)) => tx_id,
                Some(None) => {
                    return Err(Error::InvalidData(format!(
                        "Pending transaction {} is confirmed but has no transaction",
                        id
                    )))
                }
                None => {
                    return Err(Error::NotFound(format!(
                        "Pending transaction {} not found",
                        id
                    )))
                }
            };

            drop(tx);
            let existing = self.get_transaction(user_id, tx_id)?.ok_or_else(|| {
                Error::NotFound(format!("Transaction {} not found", tx_id))
            })?;
            return Ok((existing, false));
        }

        let (amount, phone, reference_code, created_at): (f64, Option<String>, String, String) =
            tx.query_row(
                "SELECT amount, counterparty_phone, reference_code, created_at
                 FROM pending_transactions WHERE user_id = ? AND id = ?",
                params![user_id, id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        tx.execute(
            r#"
            INSERT INTO transactions
                (user_id, amount, direction, description, counterparty_phone, category_id,
                 transaction_type, reference_code, is_personal, status, transaction_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                amount,
                TransactionDirection::Out.as_str(),
                description,
                phone,
                req.category_id,
                TransactionType::Mpesa.as_str(),
                reference_code,
                req.is_personal,
                TransactionStatus::Completed.as_str(),
                created_at,
            ],
        )?;
        let tx_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE pending_transactions SET transaction_id = ?
             WHERE user_id = ? AND id = ?",
            params![tx_id, user_id, id],
        )?;

        tx.commit()?;

        let transaction = self
            .get_transaction(user_id, tx_id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} vanished after insert", tx_id)))?;
        Ok((transaction, true))
    }
}
