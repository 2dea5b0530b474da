//! # MagicBox Core
//!
//! Business logic for completing a federated sign-in - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the auth subsystem, profile storage,
//!   routing and intended-destination storage
//! - `ProfileProvisioner`: idempotent profile creation
//! - `SessionResolver`: the callback state machine
//!
//! ## Architecture Principles
//! - Only depends on `magicbox-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod auth;
pub mod navigation;
pub mod user;

pub use auth::{
    AuthSubsystem, ResolverConfig, ResolverHandle, SessionResolver, SessionSubscription,
    Unsubscriber,
};
pub use navigation::{DestinationStore, Navigator};
pub use user::{ProfileProvisioner, ProvisionError, ProvisionOutcome, UserProfileRepository};
