//! SMS field extraction
//!
//! Turns free-form mobile-money notification text into a [`ParsedSms`].
//! The extractor is an ordered table of tagged pattern+handler pairs with
//! first-match-wins semantics: "sent" patterns, then "received" patterns,
//! then agent (withdraw/deposit) patterns, then a generic fallback. Each
//! handler is pure (text in, structured record out) so patterns can be
//! unit-tested independently of store state.

use regex::Regex;

use crate::error::Result;
use crate::models::{Direction, ParsedSms};

/// A single vendor-format pattern with the direction it implies
struct TaggedPattern {
    /// Rule name, surfaced on the extraction for debugging/tuning
    name: &'static str,
    direction: Direction,
    re: Regex,
}

/// Compiled extraction pattern table.
///
/// Construct once and reuse; compilation is the expensive part.
pub struct SmsParser {
    groups: Vec<Vec<TaggedPattern>>,
    code_labeled: Regex,
    code_bare: Regex,
    balance: Regex,
    fallback_amount_ksh: Regex,
    fallback_amount_grouped: Regex,
    fallback_phone: Regex,
    name_date: Regex,
    name_time: Regex,
}

/// Amount sub-pattern: digits with optional thousands separators and cents
const AMOUNT: &str = r"[\d,]+(?:\.\d+)?";

impl SmsParser {
    pub fn new() -> Result<Self> {
        // Date/time literals anchor the patterns so embedded dates are never
        // read as phone numbers or amounts. Phones are exactly 10 digits.
        let sent = vec![
            TaggedPattern {
                name: "sent_name_phone",
                direction: Direction::Sent,
                re: Regex::new(&format!(
                    r"(?i)ksh\s*(?P<amount>{AMOUNT})\s+sent\s+to\s+(?P<name>.+?)\s+(?P<phone>\d{{10}})\s+on\s+\d{{1,2}}/\d{{1,2}}/\d{{2,4}}\s+at\s+\d{{1,2}}:\d{{2}}\s*(?:am|pm)"
                ))?,
            },
            TaggedPattern {
                name: "sent_phone_name",
                direction: Direction::Sent,
                re: Regex::new(&format!(
                    r"(?i)ksh\s*(?P<amount>{AMOUNT})\s+sent\s+to\s+(?P<phone>\d{{10}})\s+(?P<name>.+?)\s+on\s+\d{{1,2}}/\d{{1,2}}/\d{{2,4}}"
                ))?,
            },
            // Till/paybill payments name a business, usually without a phone
            TaggedPattern {
                name: "paid_to_business",
                direction: Direction::Sent,
                re: Regex::new(&format!(
                    r"(?i)ksh\s*(?P<amount>{AMOUNT})\s+paid\s+to\s+(?P<name>.+?)(?:\s+(?P<phone>\d{{10}}))?\s+on\s+\d{{1,2}}/\d{{1,2}}/\d{{2,4}}"
                ))?,
            },
        ];

        let received = vec![
            TaggedPattern {
                name: "received_name_phone",
                direction: Direction::Received,
                re: Regex::new(&format!(
                    r"(?i)(?:you\s+have\s+)?received\s+ksh\s*(?P<amount>{AMOUNT})\s+from\s+(?P<name>.+?)\s+(?P<phone>\d{{10}})\s+on\s+\d{{1,2}}/\d{{1,2}}/\d{{2,4}}"
                ))?,
            },
            TaggedPattern {
                name: "received_phone_name",
                direction: Direction::Received,
                re: Regex::new(&format!(
                    r"(?i)ksh\s*(?P<amount>{AMOUNT})\s+received\s+from\s+(?P<phone>\d{{10}})\s+(?P<name>.+?)\s+on\s+\d{{1,2}}/\d{{1,2}}/\d{{2,4}}"
                ))?,
            },
        ];

        let agent = vec![
            TaggedPattern {
                name: "agent_withdraw",
                direction: Direction::Withdrawn,
                re: Regex::new(&format!(
                    r"(?i)withdraw\s+ksh\s*(?P<amount>{AMOUNT})\s+from\s+(?P<name>.+?)(?:\s+new\s+m-pesa\s+balance|\s*\.)"
                ))?,
            },
            TaggedPattern {
                name: "agent_deposit",
                direction: Direction::Deposited,
                re: Regex::new(&format!(
                    r"(?i)ksh\s*(?P<amount>{AMOUNT})\s+deposited\s+to\s+your\s+(?:m-pesa\s+)?account"
                ))?,
            },
        ];

        Ok(Self {
            groups: vec![sent, received, agent],
            code_labeled: Regex::new(
                r"(?i)(?:transaction|code|ref(?:erence)?)\s*[:.]?\s*([A-Za-z0-9]{8,12})\b",
            )?,
            code_bare: Regex::new(r"\b[A-Za-z0-9]{8,12}\b")?,
            balance: Regex::new(&format!(r"(?i)balance\s+is\s+ksh\s*({AMOUNT})"))?,
            fallback_amount_ksh: Regex::new(&format!(r"(?i)ksh\s*({AMOUNT})"))?,
            fallback_amount_grouped: Regex::new(r"\b\d{1,3}(?:,\d{3})+(?:\.\d{2})?\b")?,
            fallback_phone: Regex::new(r"\b(\d{10})\b")?,
            name_date: Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$")?,
            name_time: Regex::new(r"(?i)^\d{1,2}:\d{2}(?:\s*(?:am|pm))?$")?,
        })
    }

    /// Extract structured fields from a notification body.
    ///
    /// Never fails: an unrecognized message comes back as an invalid
    /// extraction (`is_valid() == false`) rather than an error.
    pub fn parse(&self, text: &str) -> ParsedSms {
        let text = text.trim();

        for group in &self.groups {
            for pattern in group {
                if let Some(caps) = pattern.re.captures(text) {
                    let amount = caps
                        .name("amount")
                        .map(|m| parse_amount(m.as_str()))
                        .unwrap_or(0.0);
                    let phone = caps
                        .name("phone")
                        .map(|m| m.as_str().to_string())
                        .filter(|p| p.len() == 10);
                    let name = caps
                        .name("name")
                        .and_then(|m| self.clean_name(m.as_str()));

                    return ParsedSms {
                        amount,
                        counterparty_phone: phone,
                        counterparty_name: name,
                        reference_code: self.extract_reference_code(text),
                        balance: self.extract_balance(text),
                        direction: pattern.direction,
                        matched_rule: pattern.name,
                    };
                }
            }
        }

        self.parse_fallback(text)
    }

    /// Generic fallback when no structured pattern matched: first
    /// currency-prefixed or comma-grouped number as amount, first bare
    /// 10-digit run as phone.
    fn parse_fallback(&self, text: &str) -> ParsedSms {
        let amount = self
            .fallback_amount_ksh
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| parse_amount(m.as_str()))
            .or_else(|| {
                self.fallback_amount_grouped
                    .find(text)
                    .map(|m| parse_amount(m.as_str()))
            })
            .unwrap_or(0.0);

        let phone = self
            .fallback_phone
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        ParsedSms {
            amount,
            counterparty_phone: phone,
            counterparty_name: None,
            reference_code: self.extract_reference_code(text),
            balance: self.extract_balance(text),
            direction: Direction::Unknown,
            matched_rule: "fallback",
        }
    }

    /// Reference codes are 8-12 character alphanumeric tokens. Look for an
    /// explicit transaction/code/ref label first, then fall back to the
    /// first bare token anywhere in the text. The bare scan requires at
    /// least one letter so a 10-digit phone number is never taken for a
    /// code. Shared by every extraction path.
    fn extract_reference_code(&self, text: &str) -> String {
        if let Some(caps) = self.code_labeled.captures(text) {
            if let Some(m) = caps.get(1) {
                return m.as_str().to_uppercase();
            }
        }

        self.code_bare
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|tok| tok.chars().any(|c| c.is_ascii_alphabetic()))
            .map(|tok| tok.to_uppercase())
            .unwrap_or_default()
    }

    /// Balance extraction runs against the full original text regardless of
    /// which direction pattern matched.
    fn extract_balance(&self, text: &str) -> Option<f64> {
        self.balance
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| parse_amount(m.as_str()))
    }

    /// Accept a captured token as a counterparty name only if it is not a
    /// number, currency amount, date, or time. A loose heuristic - callers
    /// must treat the result as a suggestion requiring confirmation.
    fn clean_name(&self, raw: &str) -> Option<String> {
        let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty()
            || cleaned.chars().all(|c| c.is_ascii_digit())
            || cleaned.to_lowercase().contains("ksh")
            || self.name_date.is_match(&cleaned)
            || self.name_time.is_match(&cleaned)
        {
            return None;
        }
        Some(cleaned)
    }
}

/// Strip thousands separators before numeric conversion
fn parse_amount(s: &str) -> f64 {
    s.replace(',', "").parse::<f64>().unwrap_or(0.0)
}
