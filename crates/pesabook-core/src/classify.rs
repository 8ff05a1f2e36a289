//! Line and account attribution heuristics
//!
//! Pure functions: the clock is an explicit argument so callers (and tests)
//! control it. Every decision returns the name of the rule that fired so
//! the attribution stays inspectable downstream.

use chrono::{DateTime, Timelike, Utc};

use crate::models::{AccountType, Classification, LineId, ParsedSms};

/// Counterparty keywords that mark a transaction as business spend
const BUSINESS_KEYWORDS: &[&str] = &[
    "supplier",
    "vendor",
    "wholesale",
    "ltd",
    "limited",
    "company",
    "shop",
    "store",
    "market",
    "traders",
    "distributors",
    "services",
];

/// Counterparty/text keywords that mark a transaction as personal
const PERSONAL_KEYWORDS: &[&str] = &[
    "family",
    "friend",
    "personal",
    "school fees",
    "rent",
    "church",
    "harambee",
];

/// Amounts above this are assumed to be business spend
const BUSINESS_AMOUNT_THRESHOLD: f64 = 5000.0;

/// Business hours window, inclusive start, exclusive end
const BUSINESS_HOURS: (u32, u32) = (6, 18);

fn within_business_hours(now: DateTime<Utc>) -> bool {
    let hour = now.hour();
    hour >= BUSINESS_HOURS.0 && hour < BUSINESS_HOURS.1
}

/// Decide which line a notification came from.
///
/// Device-reported metadata always wins. Without it, fall back to the
/// time-of-day guess: business hours point at the business line (LineA).
pub fn attribute_line(explicit: Option<&str>, now: DateTime<Utc>) -> (LineId, &'static str) {
    if let Some(raw) = explicit {
        if let Ok(line) = raw.parse::<LineId>() {
            return (line, "device_reported");
        }
    }

    if within_business_hours(now) {
        (LineId::LineA, "business_hours_default")
    } else {
        (LineId::LineB, "off_hours_default")
    }
}

/// Decide whether a parsed notification is business or personal spend.
///
/// Keyword hits win over the amount threshold, which wins over the
/// time-of-day fallback.
pub fn classify_account(parsed: &ParsedSms, now: DateTime<Utc>) -> (AccountType, &'static str) {
    let haystack = parsed
        .counterparty_name
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    if BUSINESS_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        return (AccountType::Business, "business_keyword");
    }
    if PERSONAL_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        return (AccountType::Personal, "personal_keyword");
    }
    if parsed.amount > BUSINESS_AMOUNT_THRESHOLD {
        return (AccountType::Business, "large_amount");
    }

    if within_business_hours(now) {
        (AccountType::Business, "business_hours")
    } else {
        (AccountType::Personal, "off_hours")
    }
}

/// Full attribution for one extraction
pub fn classify(
    parsed: &ParsedSms,
    explicit_line: Option<&str>,
    now: DateTime<Utc>,
) -> Classification {
    let (line_id, line_rule) = attribute_line(explicit_line, now);
    let (account_type, account_rule) = classify_account(parsed, now);
    Classification {
        line_id,
        account_type,
        line_rule,
        account_rule,
    }
}
