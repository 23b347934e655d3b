use sha3::{Digest, Keccak256};

use crosslock_core::constants::MIN_SECRET_LEN;
use crosslock_core::error::CrosslockError;
use crosslock_core::types::Hashlock;

/// Compute keccak-256 of arbitrary bytes → 32-byte array.
///
/// Keccak (not SHA3-256) is protocol-mandated: hashlocks must match the
/// EVM-side contracts byte for byte.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The hashlock committing to `secret`.
pub fn hashlock_of(secret: &[u8]) -> Hashlock {
    Hashlock::from_bytes(keccak256(secret))
}

/// Check a revealed preimage against a commitment. Secrets shorter than 32
/// bytes are rejected outright.
pub fn verify_secret(secret: &[u8], hashlock: &Hashlock) -> Result<(), CrosslockError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CrosslockError::InvalidSecret);
    }
    if &keccak256(secret) != hashlock.as_bytes() {
        return Err(CrosslockError::InvalidSecret);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_empty_input_vector() {
        // Known vector: keccak256("") — distinguishes keccak from SHA3-256.
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn secret_round_trip() {
        let secret = [0x11u8; 32];
        let lock = hashlock_of(&secret);
        verify_secret(&secret, &lock).unwrap();
    }

    #[test]
    fn wrong_secret_rejected() {
        let lock = hashlock_of(&[0x11u8; 32]);
        assert!(matches!(
            verify_secret(&[0x22u8; 32], &lock).unwrap_err(),
            CrosslockError::InvalidSecret
        ));
    }

    #[test]
    fn short_secret_rejected_even_if_hash_matches() {
        let short = b"too-short";
        let lock = hashlock_of(short.as_ref());
        assert!(verify_secret(short.as_ref(), &lock).is_err());
    }
}
