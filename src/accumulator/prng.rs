//! The Fortuna accumulator.
//!
//! Ties the 32 entropy pools to the block generator. Reads consult the
//! reseed trigger first, drain the scheduled pools into the generator key
//! when it fires, and then produce output. Lock order is generator, then
//! pools in ascending index, then the reseed timestamp.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use zeroize::Zeroize;

use super::pool::{Pool, MAX_EVENT_SIZE, POOL_COUNT};
use crate::config::FortunaConfig;
use crate::error::Error;
use crate::generator::Generator;

/// Locks a mutex, recovering the guard if a panicking thread poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The Fortuna PRNG: a block generator fed by 32 entropy pools.
///
/// All methods take `&self`; the instance is safe to share across threads,
/// with concurrent [`add_random_event`](Self::add_random_event) calls from
/// many sources and concurrent [`read_bytes`](Self::read_bytes) calls from
/// consumers.
///
/// A new instance produces no output until the first reseed, which fires
/// once pool 0 has absorbed `min_pool_size` bytes and the reseed rate limit
/// allows it, or until state is restored through
/// [`read_seed`](Self::read_seed).
pub struct Fortuna {
    initialised: AtomicBool,
    pools: [Mutex<Pool>; POOL_COUNT],
    reseed_counter: AtomicU32,
    generator: Mutex<Generator>,
    last_reseed: Mutex<Option<Instant>>,
    config: FortunaConfig,
}

impl Fortuna {
    /// Creates an accumulator with the default tuning parameters.
    pub fn new() -> Self {
        Self::with_config(FortunaConfig::default())
    }

    /// Creates an accumulator with the given tuning parameters.
    pub fn with_config(config: FortunaConfig) -> Self {
        Self {
            initialised: AtomicBool::new(true),
            pools: std::array::from_fn(|_| Mutex::new(Pool::default())),
            reseed_counter: AtomicU32::new(0),
            generator: Mutex::new(Generator::new()),
            last_reseed: Mutex::new(None),
            config,
        }
    }

    /// The tuning parameters this instance was built with.
    pub fn config(&self) -> &FortunaConfig {
        &self.config
    }

    /// True until the auto-update task retires the instance at shutdown.
    pub fn initialised(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    /// Number of reseeds performed so far; zero means never seeded.
    pub fn reseed_count(&self) -> u32 {
        self.reseed_counter.load(Ordering::Acquire)
    }

    /// Marks the instance as shut down, stopping further state changes.
    pub(crate) fn retire(&self) {
        self.initialised.store(false, Ordering::Release);
    }

    /// Adds one entropy event to the named pool.
    ///
    /// `source` is a caller-chosen tag identifying the producer. Callers
    /// are expected to cycle `pool` round-robin over `0..32`, evenly
    /// distributing events across the whole set; the adapters in
    /// [`sources`](crate::sources) do this automatically.
    ///
    /// Rejected events (`pool >= 32`, empty payload, payload longer than
    /// [`MAX_EVENT_SIZE`] bytes) leave every pool untouched.
    pub fn add_random_event(&self, source: u8, pool: usize, payload: &[u8]) -> Result<(), Error> {
        if !self.initialised() {
            return Err(Error::NotInitialised);
        }
        if payload.is_empty() || payload.len() > MAX_EVENT_SIZE {
            return Err(Error::InvalidEvent);
        }
        if pool >= POOL_COUNT {
            return Err(Error::InvalidEvent);
        }

        lock(&self.pools[pool]).add_event(source, payload, self.config.max_pool_bytes);
        tracing::trace!(source, pool, len = payload.len(), "entropy event added");
        Ok(())
    }

    /// Fills `dst` with pseudo-random bytes.
    ///
    /// Consults the reseed trigger before producing any output. Fails with
    /// [`Error::NotSeeded`] until the first reseed, even for an empty
    /// destination; an empty destination on a seeded instance returns
    /// `Ok(0)` without touching state.
    pub fn read_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
        if !self.initialised() {
            return Err(Error::NotInitialised);
        }

        let mut generator = lock(&self.generator);
        if self.must_reseed() {
            self.reseed(&mut generator);
        }
        if self.reseed_count() == 0 {
            return Err(Error::NotSeeded);
        }
        if dst.is_empty() {
            return Ok(0);
        }
        Ok(generator.read(dst))
    }

    /// True when pool 0 has crossed the byte threshold and the rate limit
    /// has lapsed.
    fn must_reseed(&self) -> bool {
        let pool_ready = lock(&self.pools[0]).written() >= self.config.min_pool_size;
        if !pool_ready {
            return false;
        }
        let last = *lock(&self.last_reseed);
        last.map_or(true, |at| at.elapsed() >= self.config.reseed_delay)
    }

    /// Drains the scheduled pools into the generator key.
    ///
    /// Pool `i` contributes on every `2^i`-th reseed, so higher pools
    /// accumulate entropy over exponentially longer spans and an attacker
    /// who learns the state cannot keep up with every pool at once.
    fn reseed(&self, generator: &mut Generator) {
        let counter = self.reseed_counter.fetch_add(1, Ordering::AcqRel) + 1;

        let mut seed = Vec::with_capacity(POOL_COUNT * 32);
        let mut drained = 0u32;
        for (i, pool) in self.pools.iter().enumerate() {
            if counter % (1u32 << i) == 0 {
                seed.extend_from_slice(&lock(pool).drain(self.config.pool_hash));
                drained += 1;
            }
        }
        generator.write(&seed);
        seed.zeroize();

        *lock(&self.last_reseed) = Some(Instant::now());
        tracing::info!(reseed = counter, pools = drained, "accumulator reseeded");
    }

    /// Folds a seed blob into the generator and counts it as a reseed, so
    /// a restored instance is usable without waiting for live entropy.
    pub(crate) fn absorb_seed(&self, blob: &[u8]) {
        let mut generator = lock(&self.generator);
        generator.write(blob);
        self.reseed_counter.fetch_add(1, Ordering::AcqRel);
    }

    #[cfg(test)]
    pub(crate) fn force_reseed(&self) {
        let mut generator = lock(&self.generator);
        self.reseed(&mut generator);
    }

    #[cfg(test)]
    pub(crate) fn pool_written(&self, pool: usize) -> u64 {
        lock(&self.pools[pool]).written()
    }
}

impl Default for Fortuna {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fortuna {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fortuna")
            .field("initialised", &self.initialised())
            .field("reseed_count", &self.reseed_count())
            .finish_non_exhaustive()
    }
}

impl io::Read for Fortuna {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(io::Error::other)
    }
}

impl io::Read for &Fortuna {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(io::Error::other)
    }
}

impl rand_core::RngCore for Fortuna {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    /// Panics if the accumulator has not been seeded; use
    /// [`try_fill_bytes`](rand_core::RngCore::try_fill_bytes) for fallible
    /// access.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = rand_core::RngCore::try_fill_bytes(self, dest) {
            panic!("fortuna: {err}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.read_bytes(dest)
            .map(|_| ())
            .map_err(rand_core::Error::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FortunaConfig;
    use std::time::Duration;

    /// Feeds `total` bytes of fixed filler into the named pool.
    fn fill_pool(rng: &Fortuna, pool: usize, total: usize) {
        let event = [0u8; MAX_EVENT_SIZE];
        let mut added = 0;
        while added < total {
            rng.add_random_event(0, pool, &event).unwrap();
            added += MAX_EVENT_SIZE + 2;
        }
    }

    #[test]
    fn test_not_seeded_until_first_reseed() {
        let rng = Fortuna::new();
        let mut buf = [0u8; 16];
        assert!(matches!(rng.read_bytes(&mut buf), Err(Error::NotSeeded)));
    }

    #[test]
    fn test_empty_read_unseeded_reports_not_seeded() {
        let rng = Fortuna::new();
        assert!(matches!(rng.read_bytes(&mut []), Err(Error::NotSeeded)));
    }

    #[test]
    fn test_empty_read_seeded_is_ok() {
        let rng = Fortuna::new();
        rng.force_reseed();
        assert!(matches!(rng.read_bytes(&mut []), Ok(0)));
    }

    #[test]
    fn test_read_fills_exact_lengths() {
        let rng = Fortuna::new();
        rng.force_reseed();

        for n in [1usize, 15, 16, 17, 100, 4096] {
            let mut buf = vec![0u8; n];
            assert_eq!(rng.read_bytes(&mut buf).unwrap(), n);
        }
    }

    #[test]
    fn test_consecutive_reads_differ() {
        let rng = Fortuna::new();
        rng.force_reseed();

        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        rng.read_bytes(&mut first).unwrap();
        rng.read_bytes(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_events_leave_pools_untouched() {
        let rng = Fortuna::new();

        assert!(matches!(
            rng.add_random_event(0, POOL_COUNT, &[1]),
            Err(Error::InvalidEvent)
        ));
        assert!(matches!(
            rng.add_random_event(0, usize::MAX, &[1]),
            Err(Error::InvalidEvent)
        ));
        assert!(matches!(
            rng.add_random_event(0, 0, &[]),
            Err(Error::InvalidEvent)
        ));
        assert!(matches!(
            rng.add_random_event(0, 0, &[0u8; MAX_EVENT_SIZE + 1]),
            Err(Error::InvalidEvent)
        ));

        for i in 0..POOL_COUNT {
            assert_eq!(rng.pool_written(i), 0);
        }
    }

    #[test]
    fn test_boundary_events_accepted() {
        let rng = Fortuna::new();
        rng.add_random_event(0, POOL_COUNT - 1, &[1]).unwrap();
        rng.add_random_event(0, 0, &[0u8; MAX_EVENT_SIZE]).unwrap();

        assert_eq!(rng.pool_written(POOL_COUNT - 1), 3);
        assert_eq!(rng.pool_written(0), MAX_EVENT_SIZE as u64 + 2);
    }

    #[test]
    fn test_retired_instance_rejects_events() {
        let rng = Fortuna::new();
        rng.retire();
        assert!(matches!(
            rng.add_random_event(0, 0, &[1]),
            Err(Error::NotInitialised)
        ));
    }

    #[test]
    fn test_reseed_schedule_is_staged() {
        let rng = Fortuna::new();

        for round in 1u32..=8 {
            for pool in 0..POOL_COUNT {
                rng.add_random_event(0, pool, &[round as u8]).unwrap();
            }
            rng.force_reseed();

            for pool in 0..POOL_COUNT {
                let drained = round % (1u32 << pool) == 0;
                if drained {
                    assert_eq!(
                        rng.pool_written(pool),
                        0,
                        "round {round}: pool {pool} should have drained"
                    );
                } else {
                    assert_ne!(
                        rng.pool_written(pool),
                        0,
                        "round {round}: pool {pool} should be untouched"
                    );
                }
            }
        }
        assert_eq!(rng.reseed_count(), 8);
    }

    #[test]
    fn test_reseed_rate_limited() {
        let config = FortunaConfig {
            reseed_delay: Duration::from_secs(60),
            ..FortunaConfig::default()
        };
        let rng = Fortuna::with_config(config);

        fill_pool(&rng, 0, 64);
        let mut buf = [0u8; 16];
        rng.read_bytes(&mut buf).unwrap();
        assert_eq!(rng.reseed_count(), 1);

        // Pool 0 crosses the threshold again, but the delay has not lapsed.
        fill_pool(&rng, 0, 64);
        rng.read_bytes(&mut buf).unwrap();
        assert_eq!(rng.reseed_count(), 1);
    }

    #[test]
    fn test_reseed_fires_after_delay() {
        let config = FortunaConfig {
            reseed_delay: Duration::from_millis(10),
            ..FortunaConfig::default()
        };
        let rng = Fortuna::with_config(config);

        fill_pool(&rng, 0, 64);
        let mut buf = [0u8; 16];
        rng.read_bytes(&mut buf).unwrap();
        assert_eq!(rng.reseed_count(), 1);

        fill_pool(&rng, 0, 64);
        std::thread::sleep(Duration::from_millis(20));
        rng.read_bytes(&mut buf).unwrap();
        assert_eq!(rng.reseed_count(), 2);
    }

    #[test]
    fn test_identical_history_identical_output() {
        let make = || {
            let rng = Fortuna::new();
            rng.absorb_seed(&[7u8; 64]);
            for pool in 0..4 {
                rng.add_random_event(9, pool, b"same event stream").unwrap();
            }
            rng
        };

        let (a, b) = (make(), make());
        let mut out_a = [0u8; 64];
        let mut out_b = [0u8; 64];
        a.read_bytes(&mut out_a).unwrap();
        b.read_bytes(&mut out_b).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_tunafish_variant_diverges_at_reseed() {
        let feed = |rng: &Fortuna| {
            fill_pool(rng, 0, 64);
            let mut buf = [0u8; 32];
            rng.read_bytes(&mut buf).unwrap();
            buf
        };

        let standard = feed(&Fortuna::new());
        let tunafish = feed(&Fortuna::with_config(FortunaConfig::tunafish()));
        assert_ne!(standard, tunafish);
    }

    #[test]
    fn test_concurrent_ingestion_lands_every_event() {
        let rng = Fortuna::new();
        let threads = 8;
        let events_per_thread = 100usize;

        std::thread::scope(|scope| {
            for t in 0..threads {
                let rng = &rng;
                scope.spawn(move || {
                    for _ in 0..events_per_thread {
                        rng.add_random_event(t as u8, t, &[t as u8; 16]).unwrap();
                    }
                });
            }
        });

        for t in 0..threads {
            assert_eq!(rng.pool_written(t), (events_per_thread * 18) as u64);
        }
    }

    #[test]
    fn test_concurrent_reads_reseed_once() {
        let config = FortunaConfig {
            reseed_delay: Duration::from_secs(60),
            ..FortunaConfig::default()
        };
        let rng = Fortuna::with_config(config);
        fill_pool(&rng, 0, 256);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let rng = &rng;
                scope.spawn(move || {
                    let mut buf = [0u8; 64];
                    rng.read_bytes(&mut buf).unwrap();
                });
            }
        });

        assert_eq!(rng.reseed_count(), 1);
    }

    #[test]
    fn test_rng_core_integration() {
        use rand_core::RngCore;

        let mut rng = Fortuna::new();
        let mut buf = [0u8; 8];
        assert!(rng.try_fill_bytes(&mut buf).is_err());

        rng.force_reseed();
        rng.try_fill_bytes(&mut buf).unwrap();
        let value = rng.next_u64();
        assert_ne!(value, rng.next_u64());
    }

    #[test]
    fn test_io_read_integration() {
        use std::io::Read;

        let rng = Fortuna::new();
        rng.force_reseed();

        let mut buf = [0u8; 32];
        assert_eq!((&rng).read(&mut buf).unwrap(), 32);
    }
}
