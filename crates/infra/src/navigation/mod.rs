//! Routing adapters
//!
//! - [`ChannelNavigator`]: forwards redirects to the host shell
//! - [`FileDestinationStore`] / [`InMemoryDestinationStore`]: intended
//!   destination persistence

pub mod channel;
pub mod destination_store;

pub use channel::{ChannelNavigator, NavigationRequest};
pub use destination_store::{FileDestinationStore, InMemoryDestinationStore};
