//! Entropy accumulation and reseed control.
//!
//! This module holds the 32 entropy pools and the reseed controller that
//! drains them into the block generator on a staged schedule.

mod pool;
mod prng;

pub use pool::{PoolHash, MAX_EVENT_SIZE, POOL_COUNT};
pub use prng::Fortuna;
