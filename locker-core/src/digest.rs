//! Credential digest shared by the setup and lock surfaces.
//!
//! Both surfaces must produce byte-identical output for the same canonical
//! credential string, otherwise a credential saved in the popup would never
//! verify in the content script.

use ring::digest::{digest as sha256, SHA256};
use subtle::ConstantTimeEq;

/// Length of a digest in lowercase hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of the UTF-8 bytes of `input`, lowercase hex encoded.
#[must_use]
pub fn digest(input: &str) -> String {
    hex::encode(sha256(&SHA256, input.as_bytes()))
}

/// Compare a freshly computed digest against the stored one.
///
/// Equivalent to string equality; lengths are not secret.
#[must_use]
pub fn digest_matches(attempt_hex: &str, stored_hex: &str) -> bool {
    attempt_hex.len() == stored_hex.len()
        && bool::from(attempt_hex.as_bytes().ct_eq(stored_hex.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_lowercase_hex() {
        let a = digest("hunter2");
        let b = digest("hunter2");
        assert_eq!(a, b);
        assert_eq!(a.len(), DIGEST_HEX_LEN);
        assert!(a.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_multibyte_input() {
        let hex = digest("pässwörd 🔒");
        assert_eq!(hex.len(), DIGEST_HEX_LEN);
        assert_ne!(hex, digest("passwort"));
    }

    #[test]
    fn test_digest_matches() {
        let stored = digest("1234");
        assert!(digest_matches(&digest("1234"), &stored));
        assert!(!digest_matches(&digest("1235"), &stored));
        assert!(!digest_matches(&digest("1234"), "garbage"));
        assert!(!digest_matches(&digest("1234"), ""));
    }

    #[test]
    fn test_pattern_order_matters() {
        assert_ne!(digest("0,1,2"), digest("2,1,0"));
    }
}
