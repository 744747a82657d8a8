//! Entropy pools.
//!
//! Each pool is an append-only buffer of framed events plus a byte counter.
//! Pool 0's counter drives the reseed trigger; the buffers themselves are
//! only ever hashed, at reseed time, and wiped afterwards.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use zeroize::Zeroize;

/// Number of accumulator pools.
pub const POOL_COUNT: usize = 32;

/// Maximum payload length of a single entropy event, in bytes.
pub const MAX_EVENT_SIZE: usize = 32;

/// Digest algorithm applied to pool contents at reseed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolHash {
    /// SHA-256, the standard Fortuna pool hash.
    #[default]
    Sha256,
    /// Keccak-256, the Tunafish variant.
    Keccak256,
}

/// A single entropy pool.
#[derive(Default)]
pub(crate) struct Pool {
    buffer: Vec<u8>,
    written: u64,
}

impl Pool {
    /// Appends one framed event: source byte, payload length, payload.
    ///
    /// The two-byte preamble namespaces each source's contributions so a
    /// payload cannot masquerade as another source's framing. Events that
    /// would push the buffer past `max_bytes` are dropped whole.
    pub fn add_event(&mut self, source: u8, payload: &[u8], max_bytes: usize) {
        if self.buffer.len() + payload.len() + 2 > max_bytes {
            tracing::trace!(
                pool_bytes = self.buffer.len(),
                event_len = payload.len(),
                "pool at capacity, dropping event"
            );
            return;
        }
        self.buffer.push(source);
        self.buffer.push(payload.len() as u8);
        self.buffer.extend_from_slice(payload);
        self.written += payload.len() as u64 + 2;
    }

    /// Bytes appended since the last drain.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Digests the pool contents, then wipes the buffer and resets the
    /// byte counter.
    pub fn drain(&mut self, algorithm: PoolHash) -> [u8; 32] {
        let digest: [u8; 32] = match algorithm {
            PoolHash::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(&self.buffer);
                hasher.finalize().into()
            }
            PoolHash::Keccak256 => {
                let mut hasher = Keccak256::new();
                hasher.update(&self.buffer);
                hasher.finalize().into()
            }
        };
        self.buffer.zeroize();
        self.written = 0;
        digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_CAP: usize = usize::MAX;

    #[test]
    fn test_event_framing() {
        let mut pool = Pool::default();
        pool.add_event(0x17, &[0xaa, 0xbb, 0xcc], NO_CAP);

        assert_eq!(pool.buffer, vec![0x17, 3, 0xaa, 0xbb, 0xcc]);
        assert_eq!(pool.written(), 5);
    }

    #[test]
    fn test_events_digested_in_append_order() {
        let mut pool = Pool::default();
        pool.add_event(1, b"first", NO_CAP);
        pool.add_event(2, b"second", NO_CAP);

        let mut expected = Vec::new();
        expected.extend_from_slice(&[1, 5]);
        expected.extend_from_slice(b"first");
        expected.extend_from_slice(&[2, 6]);
        expected.extend_from_slice(b"second");

        let manual: [u8; 32] = Sha256::digest(&expected).into();
        assert_eq!(pool.drain(PoolHash::Sha256), manual);
    }

    #[test]
    fn test_drain_resets_pool() {
        let mut pool = Pool::default();
        pool.add_event(0, &[1; 8], NO_CAP);
        assert_eq!(pool.written(), 10);

        pool.drain(PoolHash::Sha256);
        assert_eq!(pool.written(), 0);
        assert!(pool.buffer.is_empty());
    }

    #[test]
    fn test_pool_hashes_differ() {
        let mut a = Pool::default();
        let mut b = Pool::default();
        a.add_event(0, b"same contents", NO_CAP);
        b.add_event(0, b"same contents", NO_CAP);

        assert_ne!(a.drain(PoolHash::Sha256), b.drain(PoolHash::Keccak256));
    }

    #[test]
    fn test_full_pool_drops_whole_event() {
        let mut pool = Pool::default();
        pool.add_event(0, &[1; 8], 16);
        pool.add_event(0, &[2; 8], 16);

        assert_eq!(pool.written(), 10);
        assert_eq!(pool.buffer.len(), 10);
    }
}
