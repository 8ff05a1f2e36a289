//! Domain models for Pesabook

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw inbound notification, before any processing.
///
/// Transient: this is never persisted as-is. The original text is carried
/// onto the pending transaction for auditing, the rest is consumed by the
/// pipeline.
#[derive(Debug, Clone)]
pub struct RawNotification {
    /// Full SMS body as delivered
    pub text: String,
    /// Sender identifier (short code or alphanumeric name, e.g. "MPESA")
    pub sender_id: String,
    /// Device-reported line, if the listener knows it (e.g. "SIM1")
    pub line_id: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Coarse direction of a parsed mobile-money message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Sent,
    Received,
    Withdrawn,
    Deposited,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Received => "RECEIVED",
            Self::Withdrawn => "WITHDRAWN",
            Self::Deposited => "DEPOSITED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SENT" => Ok(Self::Sent),
            "RECEIVED" => Ok(Self::Received),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            "DEPOSITED" => Ok(Self::Deposited),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured fields extracted from a notification's text
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSms {
    pub amount: f64,
    /// Exactly-10-digit counterparty number, when one was found
    pub counterparty_phone: Option<String>,
    /// Extracted name. A loose heuristic - treat as a suggestion, never
    /// as ground truth.
    pub counterparty_name: Option<String>,
    /// Vendor transaction code. Doubles as the deduplication key.
    pub reference_code: String,
    /// Resulting account balance, when the message states one
    pub balance: Option<f64>,
    pub direction: Direction,
    /// Name of the pattern that matched (for debugging/tuning)
    pub matched_rule: &'static str,
}

impl ParsedSms {
    /// A valid extraction has a positive amount and a reference code.
    /// Invalid extractions must never create a pending transaction.
    pub fn is_valid(&self) -> bool {
        self.amount > 0.0 && !self.reference_code.is_empty()
    }
}

/// Logical originating line (dual-SIM devices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineId {
    #[serde(rename = "SIM1")]
    LineA,
    #[serde(rename = "SIM2")]
    LineB,
}

impl LineId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LineA => "SIM1",
            Self::LineB => "SIM2",
        }
    }
}

impl std::str::FromStr for LineId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SIM1" | "LINE_A" => Ok(Self::LineA),
            "SIM2" | "LINE_B" => Ok(Self::LineB),
            _ => Err(format!("Unknown line id: {}", s)),
        }
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business-vs-personal attribution of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Business,
    Personal,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Personal => "personal",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "business" => Ok(Self::Business),
            "personal" => Ok(Self::Personal),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived attribution for an extraction.
///
/// Both fields are heuristic outputs; the rule names record which
/// heuristic fired so the decision stays inspectable.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Classification {
    pub line_id: LineId,
    pub account_type: AccountType,
    pub line_rule: &'static str,
    pub account_rule: &'static str,
}

/// A pending transaction awaiting human confirmation
#[derive(Debug, Clone, Serialize)]
pub struct PendingTransaction {
    pub id: i64,
    pub user_id: String,
    /// Original SMS text, kept verbatim for auditing
    pub raw_text: String,
    pub sender_id: String,
    pub line_id: LineId,
    pub account_type: AccountType,
    /// Heuristic rule names that produced the attribution
    pub line_rule: Option<String>,
    pub account_rule: Option<String>,
    pub amount: f64,
    pub counterparty_phone: Option<String>,
    pub counterparty_name: Option<String>,
    pub reference_code: String,
    pub balance: Option<f64>,
    pub direction: Direction,
    pub is_confirmed: bool,
    /// Set once confirmed - the committed transaction this row produced
    pub transaction_id: Option<i64>,
    /// User-entered fields, set by the confirmation workflow
    pub item_name: Option<String>,
    pub supplier_name: Option<String>,
    /// Set when the user dismisses the row from the confirmation queue.
    /// Dismissed rows are hidden from listings but never deleted.
    pub dismissed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A pending transaction before DB insertion
#[derive(Debug, Clone)]
pub struct NewPendingTransaction {
    pub raw_text: String,
    pub sender_id: String,
    pub line_id: LineId,
    pub account_type: AccountType,
    pub line_rule: &'static str,
    pub account_rule: &'static str,
    pub amount: f64,
    pub counterparty_phone: Option<String>,
    pub counterparty_name: Option<String>,
    pub reference_code: String,
    pub balance: Option<f64>,
    pub direction: Direction,
}

/// Direction of a committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionDirection {
    In,
    Out,
}

impl TransactionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl std::str::FromStr for TransactionDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            _ => Err(format!("Unknown transaction direction: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the money moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    #[default]
    Mpesa,
    Bank,
    Cash,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mpesa => "MPESA",
            Self::Bank => "BANK",
            Self::Cash => "CASH",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MPESA" => Ok(Self::Mpesa),
            "BANK" => Ok(Self::Bank),
            "CASH" => Ok(Self::Cash),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Lifecycle status of a committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

/// A committed financial transaction.
///
/// Created exactly once by the confirmation workflow; immutable here
/// except for status corrections done by surrounding CRUD features.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub amount: f64,
    pub direction: TransactionDirection,
    pub description: String,
    pub counterparty_phone: Option<String>,
    pub category_id: Option<i64>,
    pub transaction_type: TransactionType,
    pub reference_code: Option<String>,
    pub is_personal: bool,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A remembered counterparty, learned from confirmations
#[derive(Debug, Clone, Serialize)]
pub struct Supplier {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    /// Recently purchased item names, most recent first, bounded
    pub common_items: Vec<String>,
    pub default_category_id: Option<i64>,
    pub is_personal: bool,
    pub total_transactions: i64,
    pub last_transaction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A remembered purchased item with running price statistics
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub category_id: Option<i64>,
    /// Arithmetic mean of all observed amounts for this item name
    pub avg_price: f64,
    pub last_price: f64,
    pub purchase_count: i64,
    pub is_personal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An expense category
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub is_business: bool,
    pub created_at: DateTime<Utc>,
}

/// User-entered fields that promote a pending transaction
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    pub item_name: String,
    pub supplier_name: String,
    pub category_id: i64,
    #[serde(default)]
    pub is_personal: bool,
}
