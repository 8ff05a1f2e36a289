//! Supplier and item memory commands

use anyhow::Result;
use pesabook_core::db::Database;

use super::LOCAL_USER;

pub fn cmd_suppliers(db: &Database) -> Result<()> {
    let suppliers = db.list_suppliers(LOCAL_USER)?;
    if suppliers.is_empty() {
        println!("No suppliers learned yet. They appear as you confirm transactions.");
        return Ok(());
    }

    println!("🏪 Suppliers ({})", suppliers.len());
    for s in suppliers {
        println!(
            "   [{}] {} ({}) - {} purchases",
            s.id, s.name, s.phone, s.total_transactions
        );
        if !s.common_items.is_empty() {
            println!("        usually: {}", s.common_items.join(", "));
        }
    }
    Ok(())
}

pub fn cmd_items(db: &Database, category: Option<i64>) -> Result<()> {
    let items = db.list_items(LOCAL_USER, category)?;
    if items.is_empty() {
        println!("No items learned yet. They appear as you confirm transactions.");
        return Ok(());
    }

    println!("📦 Items ({})", items.len());
    for i in items {
        println!(
            "   [{}] {} - avg Ksh{:.2}, last Ksh{:.2}, bought {}x",
            i.id, i.name, i.avg_price, i.last_price, i.purchase_count
        );
    }
    Ok(())
}
