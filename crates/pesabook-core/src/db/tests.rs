//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rusqlite::params;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 27, 11, 45, 0).unwrap()
    }

    fn new_pending(reference: &str, amount: f64) -> NewPendingTransaction {
        NewPendingTransaction {
            raw_text: format!("{reference} Confirmed. Ksh{amount} sent"),
            sender_id: "MPESA".to_string(),
            line_id: LineId::LineA,
            account_type: AccountType::Business,
            line_rule: "device_reported",
            account_rule: "business_keyword",
            amount,
            counterparty_phone: Some("0712345678".to_string()),
            counterparty_name: Some("JOHN KAMAU".to_string()),
            reference_code: reference.to_string(),
            balance: Some(1000.0),
            direction: Direction::Sent,
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        let pending = db.list_unconfirmed("u1").unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_schema_exists() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        for table in [
            "categories",
            "pending_transactions",
            "transactions",
            "suppliers",
            "items",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    params![table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "{} table should exist", table);
        }
    }

    #[test]
    fn test_pending_insert_and_duplicate() {
        let db = Database::in_memory().unwrap();

        let first = db.insert_pending("u1", &new_pending("QR345678", 2500.0)).unwrap();
        let inserted = match first {
            PendingInsertResult::Inserted(row) => row,
            PendingInsertResult::Duplicate(_) => panic!("First insert flagged duplicate"),
        };
        assert_eq!(inserted.reference_code, "QR345678");
        assert_eq!(inserted.line_rule.as_deref(), Some("device_reported"));
        assert!(!inserted.is_confirmed);

        let second = db.insert_pending("u1", &new_pending("QR345678", 2500.0)).unwrap();
        match second {
            PendingInsertResult::Duplicate(row) => assert_eq!(row.id, inserted.id),
            PendingInsertResult::Inserted(_) => panic!("Second insert not flagged duplicate"),
        }

        assert_eq!(db.list_unconfirmed("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_reference_uniqueness_at_sql_level() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        // Raw double insert bypassing the store API still collapses to one row
        for _ in 0..2 {
            conn.execute(
                "INSERT INTO pending_transactions
                     (user_id, raw_text, sender_id, amount, reference_code)
                 VALUES ('u1', 'text', 'MPESA', 100.0, 'QX00112233')
                 ON CONFLICT(user_id, reference_code) DO NOTHING",
                [],
            )
            .unwrap();
        }

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pending_transactions WHERE user_id = 'u1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unconfirmed_listing_order_and_filters() {
        let db = Database::in_memory().unwrap();

        let rows: Vec<_> = ["QA000001AA", "QA000002BB", "QA000003CC"]
            .iter()
            .map(|code| {
                match db.insert_pending("u1", &new_pending(code, 100.0)).unwrap() {
                    PendingInsertResult::Inserted(row) => row,
                    PendingInsertResult::Duplicate(_) => panic!("unexpected duplicate"),
                }
            })
            .collect();

        // Newest first (same timestamp resolution, so id breaks the tie)
        let listed = db.list_unconfirmed("u1").unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, rows[2].id);

        db.dismiss_pending("u1", rows[1].id, now()).unwrap();
        let listed = db.list_unconfirmed("u1").unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|p| p.id != rows[1].id));
    }

    #[test]
    fn test_confirm_pending_is_guarded() {
        let db = Database::in_memory().unwrap();
        db.seed_default_categories("u1").unwrap();
        let category_id = db.list_categories("u1").unwrap()[0].id;

        let pending = match db.insert_pending("u1", &new_pending("QR345678", 2500.0)).unwrap() {
            PendingInsertResult::Inserted(row) => row,
            PendingInsertResult::Duplicate(_) => panic!("unexpected duplicate"),
        };

        let req = ConfirmRequest {
            item_name: "Tomatoes".to_string(),
            supplier_name: "Mama Mboga".to_string(),
            category_id,
            is_personal: false,
        };

        let (tx1, created1) = db.confirm_pending("u1", pending.id, &req, "Tomatoes").unwrap();
        let (tx2, created2) = db.confirm_pending("u1", pending.id, &req, "Tomatoes").unwrap();

        assert!(created1);
        assert!(!created2);
        assert_eq!(tx1.id, tx2.id);
        assert_eq!(tx1.direction, TransactionDirection::Out);
        assert_eq!(tx1.status, TransactionStatus::Completed);
        assert_eq!(db.list_transactions("u1").unwrap().len(), 1);

        let confirmed = db.get_pending("u1", pending.id).unwrap().unwrap();
        assert!(confirmed.is_confirmed);
        assert_eq!(confirmed.transaction_id, Some(tx1.id));
        assert_eq!(confirmed.item_name.as_deref(), Some("Tomatoes"));
    }

    #[test]
    fn test_pooled_connections_share_pragmas() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);

        // Enforcement is live on ordinary pooled connections: a dangling
        // category reference is rejected
        let result = conn.execute(
            "INSERT INTO items (user_id, name, category_id, avg_price, last_price, purchase_count)
             VALUES ('u1', 'Sugar', 9999, 10.0, 10.0, 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_confirm_waits_for_write_lock() {
        let db = Database::in_memory().unwrap();
        db.seed_default_categories("u1").unwrap();
        let category_id = db.list_categories("u1").unwrap()[0].id;

        let pending_id = match db.insert_pending("u1", &new_pending("QR345678", 2500.0)).unwrap() {
            PendingInsertResult::Inserted(row) => row.id,
            PendingInsertResult::Duplicate(_) => panic!("unexpected duplicate"),
        };

        // Another connection holds the write lock while the confirmation
        // runs; busy_timeout makes the confirmation wait it out
        let locker = db.conn().unwrap();
        locker.execute_batch("BEGIN IMMEDIATE;").unwrap();

        let db2 = db.clone();
        let req = ConfirmRequest {
            item_name: "Tomatoes".to_string(),
            supplier_name: "Mama Mboga".to_string(),
            category_id,
            is_personal: false,
        };
        let handle = std::thread::spawn(move || {
            db2.confirm_pending("u1", pending_id, &req, "Tomatoes")
        });

        std::thread::sleep(std::time::Duration::from_millis(200));
        locker.execute_batch("COMMIT;").unwrap();

        let (transaction, created) = handle.join().unwrap().unwrap();
        assert!(created);
        assert_eq!(transaction.description, "Tomatoes");
        assert_eq!(db.list_transactions("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_confirm_missing_pending() {
        let db = Database::in_memory().unwrap();
        let req = ConfirmRequest {
            item_name: "Rice".to_string(),
            supplier_name: "X".to_string(),
            category_id: 1,
            is_personal: false,
        };
        let err = db.confirm_pending("u1", 404, &req, "Rice");
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_category_seed_is_idempotent() {
        let db = Database::in_memory().unwrap();
        db.seed_default_categories("u1").unwrap();
        db.seed_default_categories("u1").unwrap();

        let categories = db.list_categories("u1").unwrap();
        assert!(!categories.is_empty());
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Food Supplies"));

        // Per-user scoping
        assert!(db.list_categories("u2").unwrap().is_empty());
    }

    #[test]
    fn test_category_create_and_duplicate() {
        let db = Database::in_memory().unwrap();
        let created = db.create_category("u1", "Cleaning", true).unwrap();
        assert_eq!(created.name, "Cleaning");
        assert!(created.is_business);

        assert!(db.create_category("u1", "Cleaning", true).is_err());
        assert!(db.create_category("u1", "  ", true).is_err());
    }

    fn seeded_category(db: &Database, user_id: &str) -> i64 {
        db.seed_default_categories(user_id).unwrap();
        db.list_categories(user_id).unwrap()[0].id
    }

    #[test]
    fn test_supplier_upsert() {
        let db = Database::in_memory().unwrap();
        let cat = seeded_category(&db, "u1");

        let s = db
            .record_supplier_purchase("u1", "Kamau Supplies", "0712345678", "Tomatoes", cat, false, now())
            .unwrap();
        assert_eq!(s.total_transactions, 1);
        assert_eq!(s.common_items, vec!["Tomatoes"]);

        let s = db
            .record_supplier_purchase("u1", "Kamau Supplies", "0712345678", "Rice", cat, false, now())
            .unwrap();
        assert_eq!(s.total_transactions, 2);
        assert_eq!(s.common_items, vec!["Rice", "Tomatoes"]);

        // Re-buying an item moves it to the front without duplicating it
        let s = db
            .record_supplier_purchase("u1", "Kamau Supplies", "0712345678", "tomatoes", cat, false, now())
            .unwrap();
        assert_eq!(s.total_transactions, 3);
        assert_eq!(s.common_items, vec!["tomatoes", "Rice"]);
    }

    #[test]
    fn test_supplier_common_items_bounded() {
        let db = Database::in_memory().unwrap();
        let cat = seeded_category(&db, "u1");
        for i in 0..15 {
            db.record_supplier_purchase(
                "u1",
                "Kamau Supplies",
                "0712345678",
                &format!("Item {}", i),
                cat,
                false,
                now(),
            )
            .unwrap();
        }

        let s = db.get_supplier_by_phone("u1", "0712345678").unwrap().unwrap();
        assert_eq!(s.common_items.len(), 10);
        assert_eq!(s.common_items[0], "Item 14");
        assert_eq!(s.total_transactions, 15);
    }

    #[test]
    fn test_item_running_mean() {
        let db = Database::in_memory().unwrap();
        let cat = seeded_category(&db, "u1");

        let item = db.record_item_purchase("u1", "Sugar", 100.0, cat, false, now()).unwrap();
        assert_eq!(item.avg_price, 100.0);
        assert_eq!(item.purchase_count, 1);

        let item = db.record_item_purchase("u1", "SUGAR", 200.0, cat, false, now()).unwrap();
        assert_eq!(item.avg_price, 150.0);
        assert_eq!(item.last_price, 200.0);
        assert_eq!(item.purchase_count, 2);

        assert_eq!(db.list_items("u1", None).unwrap().len(), 1);
    }

    #[test]
    fn test_items_filter_by_category() {
        let db = Database::in_memory().unwrap();
        db.seed_default_categories("u1").unwrap();
        let categories = db.list_categories("u1").unwrap();
        let (cat_a, cat_b) = (categories[0].id, categories[1].id);

        db.record_item_purchase("u1", "Sugar", 100.0, cat_a, false, now()).unwrap();
        db.record_item_purchase("u1", "Soap", 50.0, cat_b, false, now()).unwrap();

        assert_eq!(db.list_items("u1", Some(cat_a)).unwrap().len(), 1);
        assert_eq!(db.list_items("u1", Some(cat_a)).unwrap()[0].name, "Sugar");
        assert_eq!(db.list_items("u1", None).unwrap().len(), 2);
    }
}
