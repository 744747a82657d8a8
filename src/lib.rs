//! Fortuna CSPRNG Library
//!
//! An implementation of the Fortuna cryptographically strong pseudo-random
//! number generator designed by Ferguson, Schneier, and Kohno
//! (*Cryptography Engineering*, ch. 9). Entropy events from arbitrary host
//! sources are spread across 32 pools; a staged reseed schedule drains the
//! pools into an AES-256 counter-mode generator, so the PRNG recovers from
//! state compromise once enough fresh entropy has accumulated.
//!
//! # Architecture
//!
//! ```text
//! sources → pools (×32) → reseed controller → generator → read
//!                                 seed file ⇄ generator
//! ```
//!
//! # Design Principles
//!
//! - **Staged recovery**: pool `i` contributes on every `2^i`-th reseed,
//!   so an attacker who learns the state cannot outpace every pool
//! - **Forward secrecy of output**: the generator key is replaced after
//!   every read
//! - **Rate-limited reseeds**: pool drains are bounded by a time floor,
//!   not just a byte threshold
//! - **Standard primitives**: AES-256 for the block cipher, SHA-256 for
//!   key mixing and pool digests (Keccak-256 for the Tunafish variant)
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use fortuna::{Fortuna, SourceWriter};
//!
//! let rng = Fortuna::new();
//!
//! // Feed entropy through a source adapter; real hosts would use timings,
//! // interrupts, or other unpredictable observations.
//! let mut source = SourceWriter::new(&rng, 1).unwrap();
//! source.write_all(&[0u8; 4096]).unwrap();
//!
//! let mut buf = [0u8; 32];
//! rng.read_bytes(&mut buf).unwrap();
//! ```
//!
//! Clients should cycle events over all 32 pools in a round-robin fashion;
//! both provided source adapters do this automatically. The seed-file
//! helpers ([`Fortuna::write_seed`], [`Fortuna::from_seed`]) carry PRNG
//! state across restarts, and [`Fortuna::auto_update`] keeps the file
//! fresh from a background thread.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod accumulator;
pub mod config;
pub mod error;
pub mod generator;
pub mod persistence;
pub mod sources;

// Re-export commonly used types at crate root
pub use accumulator::{Fortuna, PoolHash, MAX_EVENT_SIZE, POOL_COUNT};
pub use config::{ConfigError, FortunaConfig};
pub use error::Error;
pub use generator::{Generator, MAX_READ};
pub use persistence::{AutoUpdateTask, SEED_FILE_LENGTH};
pub use sources::{SourceChannel, SourceWriter};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
