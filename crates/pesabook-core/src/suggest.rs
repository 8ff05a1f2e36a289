//! Purpose and category suggestions for the confirmation form
//!
//! Keyword tables mapping the counterparty name and message text to a
//! likely purchase purpose and a default expense category, with
//! amount-banded fallbacks when no keyword matches. Pure functions, same
//! shape as the attribution heuristics: every suggestion carries the name
//! of the rule that produced it. Suggestions are pre-fills only; the user
//! confirms or overrides them.

use serde::Serialize;

use crate::models::ParsedSms;

/// Keyword sets matched against the counterparty and full message text,
/// first match wins
const PURPOSE_RULES: &[(&[&str], &str)] = &[
    (
        &["fresh", "vegetables", "market", "groceries", "fruits"],
        "Fresh vegetables and fruits",
    ),
    (
        &["meat", "butchery", "chicken", "fish"],
        "Meat and poultry supplies",
    ),
    (&["dairy", "milk", "cheese"], "Dairy products"),
    (&["bakery", "bread", "flour"], "Bakery items and supplies"),
    (&["soda", "juice", "drinks", "beverage"], "Beverage stock"),
    (
        &["kenya power", "kplc", "electricity", "power"],
        "Electricity bill payment",
    ),
    (&["water", "sewerage"], "Water and sewerage bill"),
    (
        &["safaricom", "airtel", "telkom", "internet", "airtime"],
        "Airtime and internet services",
    ),
    (
        &["hardware", "paint", "cement"],
        "Maintenance and repair supplies",
    ),
    (&["cleaning", "detergent", "soap"], "Cleaning supplies"),
    (
        &["salary", "wage", "staff", "employee"],
        "Staff wages and salaries",
    ),
    (
        &["transport", "fuel", "petrol", "matatu"],
        "Transportation and fuel",
    ),
    (&["landlord", "rent"], "Rent payment"),
    (&["furniture", "table", "chair"], "Furniture and equipment"),
    (&["electronics", "fridge", "tv"], "Electronic equipment"),
];

/// Keyword sets matched against the suggested purpose and the
/// counterparty, mapping onto the default category names
const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (
        &["vegetables", "fruits", "meat", "dairy", "bakery", "groceries", "food"],
        "Food Supplies",
    ),
    (&["beverage", "soda", "juice", "drinks"], "Beverages"),
    (
        &["electricity", "power", "water", "internet", "airtime", "bill"],
        "Utilities",
    ),
    (&["rent", "landlord"], "Rent"),
    (&["salary", "wage", "staff", "employee"], "Staff"),
    (
        &["furniture", "equipment", "electronics", "hardware", "maintenance", "repair", "cleaning"],
        "Equipment",
    ),
    (&["transport", "fuel", "petrol", "matatu"], "Transport"),
];

/// Category suggested when nothing else matches
const DEFAULT_CATEGORY: &str = "Food Supplies";

/// Pre-fill for the confirmation form
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurchaseSuggestion {
    pub purpose: &'static str,
    /// One of the default category names
    pub category: &'static str,
    pub purpose_rule: &'static str,
}

/// Suggest what a payment was probably for.
///
/// Keyword hits on the counterparty or message text win; otherwise the
/// amount band decides.
pub fn suggest_purpose(counterparty: &str, text: &str, amount: f64) -> (&'static str, &'static str) {
    let counterparty = counterparty.to_lowercase();
    let text = text.to_lowercase();

    for (keywords, purpose) in PURPOSE_RULES {
        if keywords
            .iter()
            .any(|kw| counterparty.contains(kw) || text.contains(kw))
        {
            return (purpose, "keyword");
        }
    }

    if amount > 50_000.0 {
        ("Bulk stock or monthly expenses", "amount_band")
    } else if amount > 20_000.0 {
        ("Weekly supplies or services", "amount_band")
    } else if amount > 5_000.0 {
        ("Daily supplies or utilities", "amount_band")
    } else if amount < 1_000.0 {
        ("Small supplies or miscellaneous", "amount_band")
    } else {
        ("General business supplies", "default")
    }
}

/// Map a purpose and counterparty onto one of the default categories
pub fn suggest_category(counterparty: &str, purpose: &str) -> &'static str {
    let counterparty = counterparty.to_lowercase();
    let purpose = purpose.to_lowercase();

    for (keywords, category) in CATEGORY_RULES {
        if keywords
            .iter()
            .any(|kw| purpose.contains(kw) || counterparty.contains(kw))
        {
            return category;
        }
    }

    DEFAULT_CATEGORY
}

/// Full suggestion for one extraction
pub fn suggest(parsed: &ParsedSms, text: &str) -> PurchaseSuggestion {
    let counterparty = parsed.counterparty_name.as_deref().unwrap_or("");
    let (purpose, purpose_rule) = suggest_purpose(counterparty, text, parsed.amount);
    let category = suggest_category(counterparty, purpose);
    PurchaseSuggestion {
        purpose,
        category,
        purpose_rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn parsed(amount: f64, name: Option<&str>) -> ParsedSms {
        ParsedSms {
            amount,
            counterparty_phone: None,
            counterparty_name: name.map(|s| s.to_string()),
            reference_code: "QR345678".to_string(),
            balance: None,
            direction: Direction::Sent,
            matched_rule: "sent_name_phone",
        }
    }

    #[test]
    fn test_counterparty_keyword_suggests_purpose_and_category() {
        let s = suggest(
            &parsed(800.0, Some("FRESH MARKET TRADERS")),
            "QR345678 Confirmed. Ksh800.00 sent to FRESH MARKET TRADERS",
        );
        assert_eq!(s.purpose, "Fresh vegetables and fruits");
        assert_eq!(s.category, "Food Supplies");
        assert_eq!(s.purpose_rule, "keyword");
    }

    #[test]
    fn test_text_keyword_suggests_without_counterparty() {
        let s = suggest(
            &parsed(1500.0, None),
            "QX11AA22BB Confirmed. Ksh1,500.00 paid for electricity token",
        );
        assert_eq!(s.purpose, "Electricity bill payment");
        assert_eq!(s.category, "Utilities");
    }

    #[test]
    fn test_staff_keyword_maps_to_staff_category() {
        let s = suggest(
            &parsed(12_000.0, Some("JOHN KAMAU")),
            "QR345678 Confirmed. Ksh12,000.00 salary payment",
        );
        assert_eq!(s.purpose, "Staff wages and salaries");
        assert_eq!(s.category, "Staff");
    }

    #[test]
    fn test_amount_bands_when_no_keyword_matches() {
        let text = "QR345678 Confirmed. payment made";
        let (purpose, rule) = suggest_purpose("JOHN KAMAU", text, 60_000.0);
        assert_eq!(purpose, "Bulk stock or monthly expenses");
        assert_eq!(rule, "amount_band");

        let (purpose, _) = suggest_purpose("JOHN KAMAU", text, 25_000.0);
        assert_eq!(purpose, "Weekly supplies or services");

        let (purpose, _) = suggest_purpose("JOHN KAMAU", text, 7_000.0);
        assert_eq!(purpose, "Daily supplies or utilities");

        let (purpose, _) = suggest_purpose("JOHN KAMAU", text, 400.0);
        assert_eq!(purpose, "Small supplies or miscellaneous");

        let (purpose, rule) = suggest_purpose("JOHN KAMAU", text, 2_500.0);
        assert_eq!(purpose, "General business supplies");
        assert_eq!(rule, "default");
    }

    #[test]
    fn test_unmatched_falls_back_to_default_category() {
        let s = suggest(
            &parsed(2_500.0, Some("JOHN KAMAU")),
            "QR345678 Confirmed. payment made",
        );
        assert_eq!(s.category, "Food Supplies");
    }
}
