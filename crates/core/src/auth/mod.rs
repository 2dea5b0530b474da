//! Sign-in completion

pub mod ports;
pub mod resolver;

pub use ports::{AuthSubsystem, SessionSubscription, Unsubscriber};
pub use resolver::{ResolverConfig, ResolverHandle, SessionResolver};
