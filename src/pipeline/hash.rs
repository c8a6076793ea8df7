//! Content fingerprinting for image deduplication.
//!
//! SHA-256 is used as a dedup key, not for secrecy: it only needs to be
//! deterministic and collision-resistant enough that byte-identical images
//! map to the same digest and distinct images practically never do.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of the given bytes.
pub fn content_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(content_digest(b"abc"), content_digest(b"abc"));
        assert_ne!(content_digest(b"abc"), content_digest(b"abd"));
    }

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256("abc") from FIPS 180-2.
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_64_hex_chars() {
        let d = content_digest(b"");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
