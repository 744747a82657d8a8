//! The block generator: an AES-256 counter-mode stream.
//!
//! This is the deterministic half of the PRNG. A 256-bit key encrypts
//! successive counter values to produce output, and the key is replaced
//! after every read so previously emitted blocks cannot be reproduced from
//! captured state. Reseeding folds arbitrary input into the key through
//! SHA-256.

mod counter;

use std::fmt;
use std::io;

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use counter::{BlockCounter, BLOCK_SIZE};

/// Bytes produced by a single block-production pass (2^16 blocks, 1 MiB).
///
/// Longer reads are served in multiple passes with a key rotation between
/// passes, so no single key ever emits more than this much keystream.
pub const MAX_READ: usize = MAX_BLOCKS * BLOCK_SIZE;

const MAX_BLOCKS: usize = 1 << 16;
const KEY_SIZE: usize = 32;
const NEW_KEY_BLOCKS: usize = KEY_SIZE / BLOCK_SIZE;

/// The keyed counter-mode stream underlying the accumulator.
///
/// A fresh generator is unseeded: the key and counter are all zeroes, and
/// the counter stays at zero until the first [`reseed`](Self::reseed) or
/// [`write`](Self::write). State is wiped when the generator is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Generator {
    key: [u8; KEY_SIZE],
    ctr: BlockCounter,
}

impl Generator {
    /// Creates a generator in the unseeded state.
    pub fn new() -> Self {
        Self {
            key: [0u8; KEY_SIZE],
            ctr: BlockCounter::new(),
        }
    }

    /// True once the generator has been seeded at least once.
    pub fn seeded(&self) -> bool {
        !self.ctr.is_zero()
    }

    /// Mixes arbitrary input into the key: `K ← SHA-256(K ‖ s)`.
    ///
    /// The counter is incremented afterwards, which also marks the
    /// generator as seeded.
    pub fn reseed(&mut self, s: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(s);
        let mut digest: [u8; KEY_SIZE] = hasher.finalize().into();
        self.key.copy_from_slice(&digest);
        digest.zeroize();
        self.ctr.increment();
    }

    /// [`reseed`](Self::reseed) under a byte-sink signature, returning the
    /// number of bytes consumed.
    pub fn write(&mut self, s: &[u8]) -> usize {
        self.reseed(s);
        s.len()
    }

    /// Returns `k * 16` bytes of raw keystream without rotating the key.
    ///
    /// Each block is the encryption of the current counter value; the
    /// counter is incremented after every block.
    pub(crate) fn generate_blocks(&mut self, k: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(k * BLOCK_SIZE);
        let cipher = Aes256::new(GenericArray::from_slice(&self.key));
        for _ in 0..k {
            let mut block = *self.ctr.as_block();
            cipher.encrypt_block(GenericArray::from_mut_slice(&mut block));
            out.extend_from_slice(&block);
            self.ctr.increment();
        }
        out
    }

    /// Fills `dst` with fresh output and installs a new key.
    ///
    /// Requests beyond [`MAX_READ`] are served in 1 MiB passes, each
    /// followed by its own key rotation. An empty destination returns 0
    /// without touching any state.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        for chunk in dst.chunks_mut(MAX_READ) {
            let k = chunk.len().div_ceil(BLOCK_SIZE);
            let mut data = self.generate_blocks(k);
            chunk.copy_from_slice(&data[..chunk.len()]);
            data.zeroize();
            self.rekey();
        }
        dst.len()
    }

    /// Replaces the key with two fresh keystream blocks.
    fn rekey(&mut self) {
        let mut new_key = self.generate_blocks(NEW_KEY_BLOCKS);
        self.key.copy_from_slice(&new_key);
        new_key.zeroize();
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("seeded", &self.seeded())
            .finish_non_exhaustive()
    }
}

impl io::Write for Generator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Generator::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
