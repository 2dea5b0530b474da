//! Hosted auth adapters
//!
//! - [`HostedAuthClient`]: `AuthSubsystem` over the hosted `/auth/v1` API
//! - [`SessionEventHub`]: listener registry the client publishes on
//! - PKCE helpers and wire payloads

pub mod events;
pub mod hosted;
pub mod pkce;
pub mod token;
pub mod wire;

pub use events::SessionEventHub;
pub use hosted::{AutoRefresh, HostedAuthClient};
pub use pkce::PkcePair;
pub use token::{AccessTokenProvider, StaticTokenProvider};
