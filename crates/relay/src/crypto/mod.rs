//! AES-CTR primitives for relaying encrypted byte ranges.
//!
//! This module is intentionally free of HTTP dependencies.
//!
//! # Counter layout
//!
//! ```text
//! IV (16 bytes) = nonce (8 bytes, opaque) || counter (u64, big-endian)
//! ```
//!
//! Serving bytes `[offset, ..)` of a stream starts from the counter
//! `counter + offset / 16` ([`resync`]) and skips `offset % 16` bytes of the
//! first keystream block ([`Keystream::at_offset`]).

pub mod counter;
pub mod key;
pub mod keystream;

pub use counter::resync;
pub use key::ContentKey;
pub use keystream::Keystream;

use common::RelayError;
use thiserror::Error;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// CTR IV size in bytes (one full counter block).
pub const IV_LEN: usize = 16;

/// A full 16-byte CTR counter block.
pub type Iv = [u8; IV_LEN];

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key is not an AES-128/192/256 key.
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The IV is not exactly [`IV_LEN`] bytes.
    #[error("invalid IV length: expected {IV_LEN} bytes, got {0}")]
    InvalidIvLength(usize),
}

/// Copy a caller-supplied IV into a fixed-size counter block.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidIvLength`] if `bytes` is not [`IV_LEN`] bytes.
pub fn iv_from_slice(bytes: &[u8]) -> Result<Iv, CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidIvLength(bytes.len()))
}

impl From<CryptoError> for RelayError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyLength(_) => RelayError::InvalidKeyMaterial(err.to_string()),
            CryptoError::InvalidIvLength(n) => RelayError::InvalidIvLength(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iv_from_slice_requires_sixteen_bytes() {
        assert_eq!(iv_from_slice(&[9u8; 16]).unwrap(), [9u8; 16]);
        assert!(matches!(
            iv_from_slice(&[0u8; 12]),
            Err(CryptoError::InvalidIvLength(12))
        ));
        assert!(iv_from_slice(&[0u8; 17]).is_err());
    }

    #[test]
    fn crypto_errors_map_to_relay_errors() {
        let e: RelayError = CryptoError::InvalidKeyLength(5).into();
        assert_eq!(e.http_status(), 400);
        assert_eq!(e.code(), "invalid_key");
        let e: RelayError = CryptoError::InvalidIvLength(8).into();
        assert!(matches!(e, RelayError::InvalidIvLength(8)));
    }
}
