//! User profile repositories

pub mod memory_profile_repository;
pub mod rest_profile_repository;

pub use memory_profile_repository::InMemoryProfileRepository;
pub use rest_profile_repository::RestProfileRepository;
