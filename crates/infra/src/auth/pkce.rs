//! PKCE (Proof Key for Code Exchange) for the hosted auth API
//!
//! Implements RFC 7636 so the browser-side flow can exchange the returned
//! `code` without a client secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Challenge method sent with the authorize request.
pub const CHALLENGE_METHOD: &str = "s256";

/// Random code verifier: 32 bytes, base64url without padding (43 chars).
pub fn generate_code_verifier() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// `BASE64URL(SHA256(verifier))`
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Verifier/challenge pair for one sign-in attempt
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// Kept locally until the code exchange
    pub code_verifier: String,
    /// Sent with the authorize request
    pub code_challenge: String,
}

impl PkcePair {
    /// Fresh random verifier and its S256 challenge
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge }
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("code_verifier", &"[redacted]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
