//! Shared test helpers for `magicbox-core` integration tests.
//!
//! In-memory fakes for every core port so resolver and provisioner tests can
//! script timing and failures deterministically.

#![allow(dead_code)]

pub mod auth;
pub mod navigation;
pub mod profiles;

use magicbox_domain::{Identity, IdentityHints, Session};

pub fn identity(id: &str, email: Option<&str>) -> Identity {
    Identity::new(id, email.map(str::to_string))
}

pub fn identity_with_name(id: &str, email: Option<&str>, full_name: &str) -> Identity {
    identity(id, email).with_hints(IdentityHints {
        full_name: Some(full_name.to_string()),
        ..IdentityHints::default()
    })
}

pub fn session_for(identity: Identity) -> Session {
    Session::new(format!("access-{}", identity.id), identity).with_refresh_token("refresh")
}
