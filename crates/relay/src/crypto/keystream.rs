//! AES-CTR keystream positioned at an arbitrary byte offset.

use aes::{Aes128, Aes192, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};

use super::{resync, ContentKey, CryptoError, Iv, BLOCK_SIZE};

// 64-bit big-endian counter in the IV's trailing half, nonce in the leading
// half. Matches the arithmetic of `resync`, including wrap-around.
type Aes128Ctr = ctr::Ctr64BE<Aes128>;
type Aes192Ctr = ctr::Ctr64BE<Aes192>;
type Aes256Ctr = ctr::Ctr64BE<Aes256>;

/// A CTR keystream generator for one of the three AES key sizes.
pub enum Keystream {
    Aes128(Aes128Ctr),
    Aes192(Aes192Ctr),
    Aes256(Aes256Ctr),
}

impl Keystream {
    /// Keystream starting at byte 0 of `iv`'s stream.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the cipher rejects the key.
    pub fn new(key: &ContentKey, iv: &Iv) -> Result<Self, CryptoError> {
        let bytes = key.as_bytes();
        let invalid = |_| CryptoError::InvalidKeyLength(bytes.len());
        match bytes.len() {
            16 => Aes128Ctr::new_from_slices(bytes, iv)
                .map(Self::Aes128)
                .map_err(invalid),
            24 => Aes192Ctr::new_from_slices(bytes, iv)
                .map(Self::Aes192)
                .map_err(invalid),
            32 => Aes256Ctr::new_from_slices(bytes, iv)
                .map(Self::Aes256)
                .map_err(invalid),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    /// Keystream whose first byte covers byte `offset` of the stream that
    /// starts at `iv`.
    ///
    /// The counter is advanced to the containing block with [`resync`], then
    /// the `offset % 16` bytes of that block preceding `offset` are generated
    /// and thrown away so arbitrary, non block-aligned offsets decrypt correctly.
    pub fn at_offset(key: &ContentKey, iv: &Iv, offset: u64) -> Result<Self, CryptoError> {
        let mut keystream = Self::new(key, &resync(iv, offset))?;
        keystream.discard((offset % BLOCK_SIZE as u64) as usize);
        Ok(keystream)
    }

    /// XOR the next `buf.len()` keystream bytes into `buf` in place.
    pub fn apply(&mut self, buf: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.apply_keystream(buf),
            Self::Aes192(c) => c.apply_keystream(buf),
            Self::Aes256(c) => c.apply_keystream(buf),
        }
    }

    fn discard(&mut self, n: usize) {
        debug_assert!(n < BLOCK_SIZE);
        let mut scratch = [0u8; BLOCK_SIZE];
        self.apply(&mut scratch[..n]);
    }
}

impl std::fmt::Debug for Keystream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Aes128(_) => "Aes128",
            Self::Aes192(_) => "Aes192",
            Self::Aes256(_) => "Aes256",
        };
        write!(f, "Keystream::{variant}")
    }
}
