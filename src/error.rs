//! Error taxonomy for the accumulator and its helpers.
//!
//! Precondition failures are typed sentinels so callers can distinguish an
//! ordering mistake from a transient filesystem problem. Filesystem errors
//! from the seed-file helpers are surfaced verbatim.

use thiserror::Error;

/// Errors returned by [`Fortuna`](crate::Fortuna) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation invoked on an instance that has been retired (or was never
    /// properly constructed).
    #[error("PRNG not initialised")]
    NotInitialised,

    /// Output was requested before the first reseed.
    #[error("PRNG not seeded yet")]
    NotSeeded,

    /// Bad pool index, empty payload, or oversized payload.
    #[error("invalid random event")]
    InvalidEvent,

    /// Seed blob of the wrong length.
    #[error("invalid seed: expected {expected} bytes, got {got}")]
    InvalidSeed {
        /// Required seed blob length.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// Filesystem failure from the seed-file helpers.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
