//! HTTP client with retry and backend error mapping

pub mod client;

pub use client::{ensure_success, HttpClient, HttpClientBuilder};
