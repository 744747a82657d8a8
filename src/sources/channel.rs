//! Queue-fed entropy source.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::accumulator::{Fortuna, POOL_COUNT};
use crate::error::Error;

/// An asynchronous entropy source.
///
/// A worker thread drains a bounded queue of opaque byte events into the
/// accumulator, round-robin over the pools, and publishes per-event errors
/// on a second bounded queue. The worker shares ownership of the
/// accumulator for as long as it runs.
pub struct SourceChannel {
    rng: Arc<Fortuna>,
    source: u8,
    input: Option<SyncSender<Vec<u8>>>,
    errors: Option<Receiver<Error>>,
    worker: Option<JoinHandle<()>>,
}

impl SourceChannel {
    /// Creates a stopped channel source for `rng`.
    ///
    /// Fails with [`Error::NotInitialised`] if the instance has been shut
    /// down.
    pub fn new(rng: Arc<Fortuna>, source: u8) -> Result<Self, Error> {
        if !rng.initialised() {
            return Err(Error::NotInitialised);
        }
        Ok(Self {
            rng,
            source,
            input: None,
            errors: None,
            worker: None,
        })
    }

    /// Allocates the bounded queues and spawns the worker.
    ///
    /// Calling `start` on a running source restarts it with fresh queues.
    pub fn start(&mut self, capacity: usize) {
        self.stop();

        let (input, events) = mpsc::sync_channel::<Vec<u8>>(capacity);
        let (err_tx, errors) = mpsc::sync_channel::<Error>(capacity);
        let rng = Arc::clone(&self.rng);
        let source = self.source;

        let worker = thread::spawn(move || {
            let mut pool = 0;
            for event in events {
                if let Err(err) = rng.add_random_event(source, pool, &event) {
                    // stop() joins the worker; error publication must not block.
                    let _ = err_tx.try_send(err);
                }
                pool = (pool + 1) % POOL_COUNT;
            }
            tracing::debug!(source, "channel source drained");
        });

        self.input = Some(input);
        self.errors = Some(errors);
        self.worker = Some(worker);
        tracing::debug!(source = self.source, capacity, "channel source started");
    }

    /// Queue end receiving entropy events, while the source is running.
    pub fn input(&self) -> Option<&SyncSender<Vec<u8>>> {
        self.input.as_ref()
    }

    /// Queue end carrying per-event errors, while the source is running.
    pub fn errors(&self) -> Option<&Receiver<Error>> {
        self.errors.as_ref()
    }

    /// Closes the input queue and waits for the worker to drain it.
    ///
    /// The worker exits once the queue is empty, closing the error queue
    /// behind it. Stopping an already-stopped source is a no-op.
    pub fn stop(&mut self) {
        self.input = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for SourceChannel {
    fn drop(&mut self) {
        self.stop();
    }
}
