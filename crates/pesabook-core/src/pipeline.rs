//! Ingestion and confirmation workflows
//!
//! `submit_notification` is the single synchronous unit of work for an
//! inbound SMS: gate, extract, attribute, dedup-insert. `confirm` promotes
//! a stored extraction to a committed transaction and feeds the
//! supplier/item memory.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::classifier;
use crate::classify;
use crate::db::{Database, PendingInsertResult};
use crate::error::{Error, Result};
use crate::models::{
    ConfirmRequest, NewPendingTransaction, ParsedSms, PendingTransaction, RawNotification,
    Supplier, Transaction,
};
use crate::parser::SmsParser;
use crate::suggest::{self, PurchaseSuggestion};

/// Outcome of submitting one notification.
///
/// Irrelevant and invalid messages are outcomes, not errors: the caller
/// decides how to surface them.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Gate reject: not a mobile-money notification
    Irrelevant,
    /// Parsed but unusable (no positive amount or no reference code).
    /// Nothing was persisted.
    Invalid(ParsedSms),
    /// Stored (or already known) pending extraction
    Accepted {
        pending: PendingTransaction,
        parsed: ParsedSms,
        /// Known supplier matching the counterparty phone, as a
        /// confirmation-form pre-fill suggestion
        supplier: Option<Supplier>,
        /// Heuristic purpose/category pre-fill for the confirmation form
        suggestion: PurchaseSuggestion,
        /// True when this reference code had been submitted before
        duplicate: bool,
    },
}

/// Process one inbound notification end to end.
pub fn submit_notification(
    db: &Database,
    parser: &SmsParser,
    user_id: &str,
    raw: &RawNotification,
    now: DateTime<Utc>,
) -> Result<SubmitOutcome> {
    if !classifier::is_relevant(&raw.sender_id, &raw.text) {
        debug!(sender = %raw.sender_id, "Notification rejected by relevance gate");
        return Ok(SubmitOutcome::Irrelevant);
    }

    let parsed = parser.parse(&raw.text);
    if !parsed.is_valid() {
        debug!(
            rule = parsed.matched_rule,
            amount = parsed.amount,
            "Extraction invalid, not storing"
        );
        return Ok(SubmitOutcome::Invalid(parsed));
    }

    let classification = classify::classify(&parsed, raw.line_id.as_deref(), now);

    let new = NewPendingTransaction {
        raw_text: raw.text.clone(),
        sender_id: raw.sender_id.clone(),
        line_id: classification.line_id,
        account_type: classification.account_type,
        line_rule: classification.line_rule,
        account_rule: classification.account_rule,
        amount: parsed.amount,
        counterparty_phone: parsed.counterparty_phone.clone(),
        counterparty_name: parsed.counterparty_name.clone(),
        reference_code: parsed.reference_code.clone(),
        balance: parsed.balance,
        direction: parsed.direction,
    };

    let (pending, duplicate) = match db.insert_pending(user_id, &new)? {
        PendingInsertResult::Inserted(row) => {
            info!(
                reference = %row.reference_code,
                amount = row.amount,
                rule = parsed.matched_rule,
                "Stored pending transaction"
            );
            (row, false)
        }
        PendingInsertResult::Duplicate(row) => {
            info!(reference = %row.reference_code, "Duplicate reference, reusing stored row");
            (row, true)
        }
    };

    let supplier = match pending.counterparty_phone.as_deref() {
        Some(phone) => db.get_supplier_by_phone(user_id, phone)?,
        None => None,
    };

    let suggestion = suggest::suggest(&parsed, &raw.text);

    Ok(SubmitOutcome::Accepted {
        pending,
        parsed,
        supplier,
        suggestion,
        duplicate,
    })
}

/// Promote a pending extraction to a committed transaction.
///
/// Idempotent: confirming an already-confirmed row returns the existing
/// transaction. The supplier/item memory updates run after the commit and
/// are best-effort; a failure there is logged and swallowed so the
/// transaction is never lost.
pub fn confirm(
    db: &Database,
    user_id: &str,
    pending_id: i64,
    req: &ConfirmRequest,
    now: DateTime<Utc>,
) -> Result<Transaction> {
    let item_name = req.item_name.trim().to_string();
    let supplier_name = req.supplier_name.trim().to_string();

    if item_name.is_empty() {
        return Err(Error::ConfirmationValidation(
            "Item name is required".to_string(),
        ));
    }
    if supplier_name.is_empty() {
        return Err(Error::ConfirmationValidation(
            "Supplier name is required".to_string(),
        ));
    }
    if req.category_id <= 0 {
        return Err(Error::ConfirmationValidation(
            "A category is required".to_string(),
        ));
    }
    if db.get_category(user_id, req.category_id)?.is_none() {
        return Err(Error::ConfirmationValidation(format!(
            "Category {} does not exist",
            req.category_id
        )));
    }

    let pending = db
        .get_pending(user_id, pending_id)?
        .ok_or_else(|| Error::NotFound(format!("Pending transaction {} not found", pending_id)))?;

    // The item name doubles as the ledger description
    let description = item_name.clone();

    let req = ConfirmRequest {
        item_name: item_name.clone(),
        supplier_name: supplier_name.clone(),
        category_id: req.category_id,
        is_personal: req.is_personal,
    };
    let (transaction, newly_created) =
        db.confirm_pending(user_id, pending_id, &req, &description)?;

    if !newly_created {
        info!(pending_id, transaction_id = transaction.id, "Confirmation retry, reusing transaction");
        return Ok(transaction);
    }

    info!(
        pending_id,
        transaction_id = transaction.id,
        amount = transaction.amount,
        "Pending transaction confirmed"
    );

    // Memory updates are enrichment, not part of the primary write
    if let Some(phone) = pending.counterparty_phone.as_deref() {
        if let Err(e) = db.record_supplier_purchase(
            user_id,
            &supplier_name,
            phone,
            &item_name,
            req.category_id,
            req.is_personal,
            now,
        ) {
            warn!(phone, error = %e, "Supplier memory update failed");
        }
    }

    if let Err(e) = db.record_item_purchase(
        user_id,
        &item_name,
        transaction.amount,
        req.category_id,
        req.is_personal,
        now,
    ) {
        warn!(item = %item_name, error = %e, "Item memory update failed");
    }

    Ok(transaction)
}

/// Hide a pending extraction from the confirmation queue.
pub fn dismiss(
    db: &Database,
    user_id: &str,
    pending_id: i64,
    now: DateTime<Utc>,
) -> Result<PendingTransaction> {
    let row = db.dismiss_pending(user_id, pending_id, now)?;
    info!(pending_id, "Pending transaction dismissed");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup() -> (Database, SmsParser) {
        let db = Database::in_memory().unwrap();
        db.seed_default_categories("u1").unwrap();
        (db, SmsParser::new().unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 27, 11, 45, 0).unwrap()
    }

    fn notification(text: &str) -> RawNotification {
        RawNotification {
            text: text.to_string(),
            sender_id: "MPESA".to_string(),
            line_id: None,
            received_at: now(),
        }
    }

    fn sent_sms(code: &str, amount: &str) -> String {
        format!(
            "{code} Confirmed. Ksh{amount} sent to JOHN KAMAU 0712345678 on 27/8/25 at 2:45 PM. New balance is Ksh15,750.50"
        )
    }

    fn first_category(db: &Database) -> i64 {
        db.list_categories("u1").unwrap()[0].id
    }

    fn confirm_req(item: &str, supplier: &str, category_id: i64) -> ConfirmRequest {
        ConfirmRequest {
            item_name: item.to_string(),
            supplier_name: supplier.to_string(),
            category_id,
            is_personal: false,
        }
    }

    #[test]
    fn test_irrelevant_message_persists_nothing() {
        let (db, parser) = setup();
        let raw = RawNotification {
            text: "See you at lunch".to_string(),
            sender_id: "0799000111".to_string(),
            line_id: None,
            received_at: now(),
        };
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Irrelevant));
        assert!(db.list_unconfirmed("u1").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_extraction_persists_nothing() {
        let (db, parser) = setup();
        let raw = notification("Confirmed. something garbled, no amount here");
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(db.list_unconfirmed("u1").unwrap().is_empty());
    }

    #[test]
    fn test_accepted_and_duplicate() {
        let (db, parser) = setup();
        let raw = notification(&sent_sms("QR345678", "2,500.00"));

        let first = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        match first {
            SubmitOutcome::Accepted {
                ref pending,
                duplicate,
                ..
            } => {
                assert!(!duplicate);
                assert_eq!(pending.reference_code, "QR345678");
                assert_eq!(pending.amount, 2500.0);
            }
            other => panic!("Expected Accepted, got {:?}", other),
        }

        let second = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        match second {
            SubmitOutcome::Accepted { duplicate, .. } => assert!(duplicate),
            other => panic!("Expected Accepted, got {:?}", other),
        }

        assert_eq!(db.list_unconfirmed("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_accepted_carries_purchase_suggestion() {
        let (db, parser) = setup();
        let raw = notification(
            "QF55667788 Confirmed. Ksh1,200.00 sent to FRESH MARKET TRADERS 0712345678 on 27/8/25 at 2:45 PM",
        );
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        match outcome {
            SubmitOutcome::Accepted { suggestion, .. } => {
                assert_eq!(suggestion.purpose, "Fresh vegetables and fruits");
                assert_eq!(suggestion.category, "Food Supplies");
                assert_eq!(suggestion.purpose_rule, "keyword");
            }
            other => panic!("Expected Accepted, got {:?}", other),
        }
    }

    #[test]
    fn test_confirm_creates_one_transaction() {
        let (db, parser) = setup();
        let raw = notification(&sent_sms("QR345678", "2,500.00"));
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        let pending = match outcome {
            SubmitOutcome::Accepted { pending, .. } => pending,
            other => panic!("Expected Accepted, got {:?}", other),
        };

        let category_id = first_category(&db);
        let req = confirm_req("Tomatoes", "Mama Mboga", category_id);

        let tx1 = confirm(&db, "u1", pending.id, &req, now()).unwrap();
        let tx2 = confirm(&db, "u1", pending.id, &req, now()).unwrap();

        assert_eq!(tx1.id, tx2.id);
        assert_eq!(db.list_transactions("u1").unwrap().len(), 1);
        assert_eq!(tx1.description, "Tomatoes");
        assert_eq!(tx1.amount, 2500.0);
        assert_eq!(tx1.reference_code.as_deref(), Some("QR345678"));

        // Confirmed row leaves the queue
        assert!(db.list_unconfirmed("u1").unwrap().is_empty());
    }

    #[test]
    fn test_confirm_validation() {
        let (db, parser) = setup();
        let raw = notification(&sent_sms("QR345678", "2,500.00"));
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        let pending = match outcome {
            SubmitOutcome::Accepted { pending, .. } => pending,
            other => panic!("Expected Accepted, got {:?}", other),
        };
        let category_id = first_category(&db);

        let err = confirm(&db, "u1", pending.id, &confirm_req(" ", "X", category_id), now());
        assert!(matches!(err, Err(Error::ConfirmationValidation(_))));

        let err = confirm(&db, "u1", pending.id, &confirm_req("Rice", "", category_id), now());
        assert!(matches!(err, Err(Error::ConfirmationValidation(_))));

        let err = confirm(&db, "u1", pending.id, &confirm_req("Rice", "X", 0), now());
        assert!(matches!(err, Err(Error::ConfirmationValidation(_))));

        let err = confirm(&db, "u1", pending.id, &confirm_req("Rice", "X", 99999), now());
        assert!(matches!(err, Err(Error::ConfirmationValidation(_))));

        // Nothing committed by rejected confirmations
        assert!(db.list_transactions("u1").unwrap().is_empty());
    }

    #[test]
    fn test_confirm_unknown_pending_is_not_found() {
        let (db, _) = setup();
        let category_id = first_category(&db);
        let err = confirm(&db, "u1", 404, &confirm_req("Rice", "X", category_id), now());
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_supplier_memory_grows_across_confirmations() {
        let (db, parser) = setup();
        let category_id = first_category(&db);

        for (code, item) in [("QR100000AA", "Tomatoes"), ("QR200000BB", "Rice")] {
            let raw = notification(&sent_sms(code, "1,000.00"));
            let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
            let pending = match outcome {
                SubmitOutcome::Accepted { pending, .. } => pending,
                other => panic!("Expected Accepted, got {:?}", other),
            };
            confirm(
                &db,
                "u1",
                pending.id,
                &confirm_req(item, "Kamau Supplies", category_id),
                now(),
            )
            .unwrap();
        }

        let supplier = db
            .get_supplier_by_phone("u1", "0712345678")
            .unwrap()
            .unwrap();
        assert_eq!(supplier.total_transactions, 2);
        assert_eq!(supplier.common_items, vec!["Rice", "Tomatoes"]);
        assert!(supplier.last_transaction_date.is_some());
    }

    #[test]
    fn test_item_memory_running_mean() {
        let (db, parser) = setup();
        let category_id = first_category(&db);

        for (code, amount, item) in [
            ("QR100000AA", "100.00", "Sugar"),
            ("QR200000BB", "200.00", "sugar"),
            ("QR300000CC", "600.00", "SUGAR"),
        ] {
            let raw = notification(&sent_sms(code, amount));
            let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
            let pending = match outcome {
                SubmitOutcome::Accepted { pending, .. } => pending,
                other => panic!("Expected Accepted, got {:?}", other),
            };
            confirm(
                &db,
                "u1",
                pending.id,
                &confirm_req(item, "Kamau Supplies", category_id),
                now(),
            )
            .unwrap();
        }

        // Case-insensitive match keeps one row with the running mean
        let item = db.get_item_by_name("u1", "sugar").unwrap().unwrap();
        assert_eq!(item.purchase_count, 3);
        assert_eq!(item.avg_price, 300.0);
        assert_eq!(item.last_price, 600.0);
    }

    #[test]
    fn test_known_supplier_suggested_on_submit() {
        let (db, parser) = setup();
        let category_id = first_category(&db);

        let raw = notification(&sent_sms("QR100000AA", "500.00"));
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        let pending = match outcome {
            SubmitOutcome::Accepted { pending, .. } => pending,
            other => panic!("Expected Accepted, got {:?}", other),
        };
        confirm(
            &db,
            "u1",
            pending.id,
            &confirm_req("Tomatoes", "Kamau Supplies", category_id),
            now(),
        )
        .unwrap();

        let raw = notification(&sent_sms("QR200000BB", "700.00"));
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        match outcome {
            SubmitOutcome::Accepted { supplier, .. } => {
                assert_eq!(supplier.unwrap().name, "Kamau Supplies");
            }
            other => panic!("Expected Accepted, got {:?}", other),
        }
    }

    #[test]
    fn test_dismiss_hides_from_queue() {
        let (db, parser) = setup();
        let raw = notification(&sent_sms("QR345678", "2,500.00"));
        let outcome = submit_notification(&db, &parser, "u1", &raw, now()).unwrap();
        let pending = match outcome {
            SubmitOutcome::Accepted { pending, .. } => pending,
            other => panic!("Expected Accepted, got {:?}", other),
        };

        let dismissed = dismiss(&db, "u1", pending.id, now()).unwrap();
        assert!(dismissed.dismissed_at.is_some());
        assert!(db.list_unconfirmed("u1").unwrap().is_empty());

        // Still confirmable after dismissal
        let category_id = first_category(&db);
        let tx = confirm(
            &db,
            "u1",
            pending.id,
            &confirm_req("Rice", "X Stores", category_id),
            now(),
        )
        .unwrap();
        assert_eq!(tx.amount, 2500.0);
    }

    #[test]
    fn test_users_are_isolated() {
        let (db, parser) = setup();
        db.seed_default_categories("u2").unwrap();

        let raw = notification(&sent_sms("QR345678", "2,500.00"));
        submit_notification(&db, &parser, "u1", &raw, now()).unwrap();

        // Same reference for another user is not a duplicate
        let outcome = submit_notification(&db, &parser, "u2", &raw, now()).unwrap();
        match outcome {
            SubmitOutcome::Accepted { duplicate, .. } => assert!(!duplicate),
            other => panic!("Expected Accepted, got {:?}", other),
        }

        assert_eq!(db.list_unconfirmed("u1").unwrap().len(), 1);
        assert_eq!(db.list_unconfirmed("u2").unwrap().len(), 1);
    }
}
