//! # MagicBox Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Hosted auth client (PKCE sign-in, session events, refresh)
//! - User profile repositories (hosted data API, in-memory)
//! - HTTP client with retry and backend error mapping
//! - Navigation and intended-destination adapters
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `magicbox-core`
//! - Depends on `magicbox-domain` and `magicbox-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod auth;
pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod http;
pub mod navigation;
pub mod observability;

// Re-export commonly used items
pub use auth::{HostedAuthClient, SessionEventHub};
pub use context::AuthContext;
pub use database::{InMemoryProfileRepository, RestProfileRepository};
pub use errors::InfraError;
pub use http::HttpClient;
pub use navigation::{ChannelNavigator, FileDestinationStore, InMemoryDestinationStore, NavigationRequest};
pub use observability::{init_tracing, LogFormat};
