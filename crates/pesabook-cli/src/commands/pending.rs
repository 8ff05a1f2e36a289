//! Confirmation queue commands

use anyhow::Result;
use chrono::Utc;
use pesabook_core::db::Database;
use pesabook_core::models::ConfirmRequest;
use pesabook_core::pipeline;

use super::LOCAL_USER;

pub fn cmd_pending(db: &Database) -> Result<()> {
    let pending = db.list_unconfirmed(LOCAL_USER)?;
    if pending.is_empty() {
        println!("✨ Confirmation queue is empty");
        return Ok(());
    }

    println!("📥 Pending transactions ({})", pending.len());
    for p in pending {
        println!(
            "   [{}] Ksh{:.2} {} {} ({}, ref {})",
            p.id,
            p.amount,
            p.direction,
            p.counterparty_name.as_deref().unwrap_or("(unknown)"),
            p.account_type,
            p.reference_code,
        );
    }
    Ok(())
}

pub fn cmd_confirm(
    db: &Database,
    id: i64,
    item: &str,
    supplier: &str,
    category: i64,
    personal: bool,
) -> Result<()> {
    let req = ConfirmRequest {
        item_name: item.to_string(),
        supplier_name: supplier.to_string(),
        category_id: category,
        is_personal: personal,
    };

    let transaction = pipeline::confirm(db, LOCAL_USER, id, &req, Utc::now())?;

    println!("✅ Confirmed as transaction #{}", transaction.id);
    println!("   {} Ksh{:.2} ({})", transaction.description, transaction.amount, transaction.direction);
    Ok(())
}

pub fn cmd_dismiss(db: &Database, id: i64) -> Result<()> {
    pipeline::dismiss(db, LOCAL_USER, id, Utc::now())?;
    println!("🙈 Dismissed pending transaction #{}", id);
    Ok(())
}

pub fn cmd_transactions(db: &Database) -> Result<()> {
    let transactions = db.list_transactions(LOCAL_USER)?;
    if transactions.is_empty() {
        println!("No committed transactions yet");
        return Ok(());
    }

    println!("📒 Transactions ({})", transactions.len());
    for t in transactions {
        println!(
            "   [{}] {} Ksh{:.2} {} ({})",
            t.id,
            t.transaction_date.format("%Y-%m-%d"),
            t.amount,
            t.description,
            t.reference_code.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
