//! Parse and submit commands

use anyhow::Result;
use chrono::Utc;
use pesabook_core::db::Database;
use pesabook_core::models::RawNotification;
use pesabook_core::parser::SmsParser;
use pesabook_core::pipeline::{self, SubmitOutcome};

use super::LOCAL_USER;

/// Run a message through the extractor only, printing the result as JSON
pub fn cmd_parse(text: &str) -> Result<()> {
    let parser = SmsParser::new()?;
    let parsed = parser.parse(text);

    println!("{}", serde_json::to_string_pretty(&parsed)?);
    if !parsed.is_valid() {
        println!();
        println!("⚠️  Extraction is not valid (needs a positive amount and a reference code)");
    }
    Ok(())
}

/// Run a message through the full pipeline against the local database
pub fn cmd_submit(db: &Database, text: &str, sender: &str, line: Option<&str>) -> Result<()> {
    let parser = SmsParser::new()?;
    let now = Utc::now();

    db.seed_default_categories(LOCAL_USER)?;

    let raw = RawNotification {
        text: text.to_string(),
        sender_id: sender.to_string(),
        line_id: line.map(|s| s.to_string()),
        received_at: now,
    };

    match pipeline::submit_notification(db, &parser, LOCAL_USER, &raw, now)? {
        SubmitOutcome::Irrelevant => {
            println!("⏭️  Not a mobile-money notification, nothing stored");
        }
        SubmitOutcome::Invalid(parsed) => {
            println!("⚠️  Could not extract a valid transaction (rule: {})", parsed.matched_rule);
            println!("   Nothing stored");
        }
        SubmitOutcome::Accepted {
            pending,
            supplier,
            suggestion,
            duplicate,
            ..
        } => {
            if duplicate {
                println!("👯 Reference {} already stored as pending #{}", pending.reference_code, pending.id);
            } else {
                println!("✅ Stored pending transaction #{}", pending.id);
                println!("   Amount: Ksh{:.2}", pending.amount);
                println!("   Reference: {}", pending.reference_code);
                if let Some(name) = &pending.counterparty_name {
                    println!("   Counterparty: {}", name);
                }
                println!(
                    "   Attribution: {} / {} ({} / {})",
                    pending.line_id,
                    pending.account_type,
                    pending.line_rule.as_deref().unwrap_or("-"),
                    pending.account_rule.as_deref().unwrap_or("-"),
                );
            }
            if let Some(supplier) = supplier {
                println!("   💡 Known supplier: {} ({} previous purchases)", supplier.name, supplier.total_transactions);
            }
            println!(
                "   💡 Suggested: {} (category: {})",
                suggestion.purpose, suggestion.category
            );
            println!();
            println!("Confirm with: pesabook confirm {} --item <item> --supplier <name> --category <id>", pending.id);
        }
    }
    Ok(())
}
