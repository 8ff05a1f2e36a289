//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod categories;
pub mod memory;
pub mod notifications;
pub mod pending;
pub mod transactions;

// Re-export all handlers for use in router
pub use categories::*;
pub use memory::*;
pub use notifications::*;
pub use pending::*;
pub use transactions::*;
