//! User profile provisioning

pub mod ports;
pub mod provisioner;

pub use ports::UserProfileRepository;
pub use provisioner::{ProfileProvisioner, ProvisionError, ProvisionOutcome};
