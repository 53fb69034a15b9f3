// src/utils/crypto.rs
//! Digest helpers for canonical messages.
//!
//! Every signature in the system covers the SHA-256 digest of a canonical
//! message, never the message bytes directly.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of the input data.
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the digest.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_vector() {
        let digest = hash_data(b"abc");
        assert_eq!(
            digest[..4],
            [0xba, 0x78, 0x16, 0xbf],
            "SHA-256(\"abc\") starts with ba7816bf"
        );
    }

    #[test]
    fn test_hash_differs_per_message() {
        assert_ne!(hash_data(b"id=42"), hash_data(b"id=43"));
    }
}
