//! Error handling
//!
//! Defines error types and reporting for the storage manager.

pub mod handlers;
pub mod types;

pub use types::*;
