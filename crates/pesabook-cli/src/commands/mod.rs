//! Command implementations
//!
//! Argument definitions live in the `cli` module; each submodule here
//! implements a group of related commands.

mod core;
mod memory;
mod notifications;
mod pending;
mod serve;

pub use core::*;
pub use memory::*;
pub use notifications::*;
pub use pending::*;
pub use serve::*;
