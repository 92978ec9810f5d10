//! Offset-to-counter resynchronization for AES-CTR with a 64-bit counter.

use super::{Iv, BLOCK_SIZE, IV_LEN};

/// Derive the IV whose keystream starts at the block containing byte `offset`.
///
/// The trailing 8 bytes of `iv` are read as a big-endian `u64` block counter
/// and advanced by `offset / 16`, wrapping on overflow exactly like the
/// cipher's own counter. The leading 8 nonce bytes are left untouched.
///
/// This only aligns to the block. When `offset % 16 != 0` the first
/// `offset % 16` keystream bytes of the returned IV still belong to bytes
/// before `offset`; [`Keystream::at_offset`](super::Keystream::at_offset)
/// discards them.
pub fn resync(iv: &Iv, offset: u64) -> Iv {
    let block_offset = offset / BLOCK_SIZE as u64;

    let mut counter_bytes = [0u8; 8];
    counter_bytes.copy_from_slice(&iv[8..IV_LEN]);
    let counter = u64::from_be_bytes(counter_bytes).wrapping_add(block_offset);

    let mut out = *iv;
    out[8..IV_LEN].copy_from_slice(&counter.to_be_bytes());
    out
}
