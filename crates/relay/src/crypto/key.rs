//! [`ContentKey`]: caller-supplied AES key for a single relay.

use super::CryptoError;

/// Raw AES key bytes (16, 24 or 32 bytes).
///
/// Constructed per request from caller-supplied material and dropped when the
/// request ends. The buffer is overwritten with zeroes on drop.
pub struct ContentKey(Box<[u8]>);

impl ContentKey {
    /// Validate and take ownership of raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless `bytes` is 16, 24 or 32 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self(bytes.into_boxed_slice())),
            n => {
                let mut bytes = bytes;
                bytes.iter_mut().for_each(|b| *b = 0);
                Err(CryptoError::InvalidKeyLength(n))
            }
        }
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key size in bits (128, 192 or 256).
    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "ContentKey(AES-{}, [REDACTED])", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_aes_key_sizes() {
        for len in [16, 24, 32] {
            let key = ContentKey::new(vec![7u8; len]).unwrap();
            assert_eq!(key.as_bytes().len(), len);
            assert_eq!(key.bits(), len * 8);
        }
    }

    #[test]
    fn rejects_other_sizes() {
        for len in [0, 1, 15, 17, 31, 33, 64] {
            assert!(matches!(
                ContentKey::new(vec![0u8; len]),
                Err(CryptoError::InvalidKeyLength(n)) if n == len
            ));
        }
    }

    #[test]
    fn redacted_in_debug() {
        let key = ContentKey::new(vec![0xAB; 32]).unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(dbg.contains("AES-256"));
        assert!(!dbg.to_lowercase().contains("ab, ab"));
    }
}
