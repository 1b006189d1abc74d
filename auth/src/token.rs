//! Opaque session tokens.
//!
//! A token is 32 bytes of OS randomness, URL-safe base64 on the wire.
//! Only its SHA-256 digest is stored; lookups hash the presented token and
//! compare digests, so a database dump never reveals a live token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use constant_time_eq::constant_time_eq;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw entropy per token, in bytes.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh bearer token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a token for storage or lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Compare two token digests without early exit.
#[must_use]
pub fn digests_match(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes → 43 base64 chars without padding
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn hashing_is_deterministic_and_one_way() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn digest_comparison() {
        let token = generate_token();
        let digest = hash_token(&token);
        assert!(digests_match(&digest, &hash_token(&token)));
        assert!(!digests_match(&digest, &hash_token("other")));
    }
}
