//! # MagicBox Domain
//!
//! Business domain types and models for the MagicBox sign-in flow.
//!
//! This crate contains:
//! - Identity, session and user profile types
//! - Callback location parsing and intended-destination handling
//! - Resolver states, failures and outcomes
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other MagicBox crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
