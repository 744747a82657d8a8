//! Entropy source adapters.
//!
//! Sources push events into the accumulator, cycling through the pools in
//! a round-robin fashion as the Fortuna design requires. Two shapes are
//! provided: a synchronous byte sink for callers that already hold the
//! entropy, and a queue-fed worker for producers running on their own
//! threads.

mod channel;
mod writer;

pub use channel::SourceChannel;
pub use writer::SourceWriter;
