//! Pesabook Core Library
//!
//! Shared functionality for the Pesabook mobile-money expense tracker:
//! - Relevance gate for inbound SMS notifications
//! - Field extraction from vendor notification formats
//! - Line and account attribution heuristics
//! - Pending-extraction store with reference-code dedup
//! - Confirmation workflow and supplier/item memory
//! - Encrypted SQLite persistence

pub mod classifier;
pub mod classify;
pub mod db;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod suggest;

pub use db::{Database, PendingInsertResult};
pub use error::{Error, Result};
pub use models::{
    AccountType, Category, Classification, ConfirmRequest, Direction, Item, LineId,
    NewPendingTransaction, ParsedSms, PendingTransaction, RawNotification, Supplier, Transaction,
    TransactionDirection, TransactionStatus, TransactionType,
};
pub use parser::SmsParser;
pub use pipeline::SubmitOutcome;
pub use suggest::PurchaseSuggestion;
