//! Byte-sink entropy source.

use std::io;

use crate::accumulator::{Fortuna, MAX_EVENT_SIZE, POOL_COUNT};
use crate::error::Error;

/// An [`io::Write`] adapter that chops incoming bytes into entropy events.
///
/// Each write is split into chunks of at most [`MAX_EVENT_SIZE`] bytes, and
/// each chunk lands in the next pool in round-robin order. The writer
/// borrows the accumulator, so it cannot outlive it.
pub struct SourceWriter<'a> {
    rng: &'a Fortuna,
    source: u8,
    next_pool: usize,
}

impl<'a> SourceWriter<'a> {
    /// Creates a writer feeding `rng` under the given source identifier.
    ///
    /// Fails with [`Error::NotInitialised`] if the instance has been shut
    /// down.
    pub fn new(rng: &'a Fortuna, source: u8) -> Result<Self, Error> {
        if !rng.initialised() {
            return Err(Error::NotInitialised);
        }
        Ok(Self {
            rng,
            source,
            next_pool: 0,
        })
    }
}

impl io::Write for SourceWriter<'_> {
    /// Absorbs `buf` as entropy, returning the byte count absorbed before
    /// the first failure.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut absorbed = 0;
        for chunk in buf.chunks(MAX_EVENT_SIZE) {
            let result = self.rng.add_random_event(self.source, self.next_pool, chunk);
            self.next_pool = (self.next_pool + 1) % POOL_COUNT;
            if let Err(err) = result {
                if absorbed == 0 {
                    return Err(io::Error::other(err));
                }
                return Ok(absorbed);
            }
            absorbed += chunk.len();
        }
        Ok(absorbed)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_chops_into_events_round_robin() {
        let rng = Fortuna::new();
        let mut writer = SourceWriter::new(&rng, 5).unwrap();

        // 100 bytes: three full events and a 4-byte tail.
        let n = writer.write(&[0xabu8; 100]).unwrap();
        assert_eq!(n, 100);

        for pool in 0..3 {
            assert_eq!(rng.pool_written(pool), MAX_EVENT_SIZE as u64 + 2);
        }
        assert_eq!(rng.pool_written(3), 6);
        assert_eq!(rng.pool_written(4), 0);
    }

    #[test]
    fn test_round_robin_wraps_across_writes() {
        let rng = Fortuna::new();
        let mut writer = SourceWriter::new(&rng, 5).unwrap();

        writer.write_all(&[0u8; MAX_EVENT_SIZE * POOL_COUNT]).unwrap();
        writer.write_all(&[0u8; MAX_EVENT_SIZE]).unwrap();

        assert_eq!(rng.pool_written(0), 2 * (MAX_EVENT_SIZE as u64 + 2));
        assert_eq!(rng.pool_written(1), MAX_EVENT_SIZE as u64 + 2);
    }

    #[test]
    fn test_empty_write_is_noop() {
        let rng = Fortuna::new();
        let mut writer = SourceWriter::new(&rng, 5).unwrap();
        assert_eq!(writer.write(&[]).unwrap(), 0);
    }

    #[test]
    fn test_enough_input_seeds_the_accumulator() {
        let rng = Fortuna::new();
        let mut writer = SourceWriter::new(&rng, 1).unwrap();
        writer.write_all(&[0u8; 4096]).unwrap();

        let mut buf = [0u8; 32];
        assert_eq!(rng.read_bytes(&mut buf).unwrap(), 32);
    }

    #[test]
    fn test_rejects_retired_instance() {
        let rng = Fortuna::new();
        rng.retire();
        assert!(matches!(
            SourceWriter::new(&rng, 1),
            Err(Error::NotInitialised)
        ));
    }

    #[test]
    fn test_write_fails_once_instance_retires() {
        let rng = Fortuna::new();
        let mut writer = SourceWriter::new(&rng, 1).unwrap();
        rng.retire();
        assert!(writer.write(&[0u8; 8]).is_err());
    }
}
