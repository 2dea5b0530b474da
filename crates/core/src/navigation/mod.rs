//! Redirect routing and intended-destination handling

pub mod intended;
pub mod ports;

pub use intended::{capture_intended_destination, resolve_destination, restore_intended_destination};
pub use ports::{DestinationStore, Navigator};
