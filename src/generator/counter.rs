//! The 128-bit block counter.

use zeroize::Zeroize;

/// Width of one cipher block in bytes.
pub(crate) const BLOCK_SIZE: usize = 16;

/// A 128-bit little-endian counter fed directly to the cipher as the
/// plaintext block.
///
/// Kept as a fixed byte buffer rather than a native integer so the block
/// layout is identical on every host.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub(crate) struct BlockCounter([u8; BLOCK_SIZE]);

impl BlockCounter {
    /// A counter at zero, the unseeded state.
    pub fn new() -> Self {
        Self([0u8; BLOCK_SIZE])
    }

    /// Increments the counter by one, wrapping at 2^128.
    pub fn increment(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                return;
            }
        }
    }

    /// True only before the first increment (or after a full 2^128 cycle).
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// The counter value as a cipher input block.
    #[inline]
    pub fn as_block(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}
