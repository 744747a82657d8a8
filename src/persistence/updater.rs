//! Background seed-file refresh.
//!
//! The Fortuna authors recommend rewriting the seed file every ten minutes
//! and once more at shutdown. The task here does exactly that on a plain
//! OS thread, reporting filesystem failures on an error channel rather
//! than interrupting its schedule.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::accumulator::Fortuna;
use crate::error::Error;

/// Handle to a running auto-update task.
///
/// The task is stopped through the shutdown channel handed to
/// [`Fortuna::auto_update`]: sending a value or dropping the sender both
/// signal shutdown. Dropping this handle does not stop the task.
pub struct AutoUpdateTask {
    errors: Receiver<Error>,
    handle: JoinHandle<()>,
}

impl AutoUpdateTask {
    /// Receiver carrying seed-file write failures.
    ///
    /// The channel closes once the task has observed shutdown and written
    /// the final seed file.
    pub fn errors(&self) -> &Receiver<Error> {
        &self.errors
    }

    /// Waits for the task to observe shutdown and exit, returning the
    /// error receiver so remaining failures can be drained.
    pub fn join(self) -> Receiver<Error> {
        let _ = self.handle.join();
        self.errors
    }
}

impl Fortuna {
    /// Spawns a background task refreshing the seed file at `path` on
    /// every tick of the configured `auto_update_interval`.
    ///
    /// On shutdown the task writes the seed file one final time, forwards
    /// any error, closes the error channel, and retires the instance so no
    /// further state changes occur. The task shares ownership of the
    /// instance until it exits; callers keep their own `Arc` handle.
    pub fn auto_update(
        self: Arc<Self>,
        path: impl Into<PathBuf>,
        shutdown: Receiver<()>,
    ) -> AutoUpdateTask {
        let rng = self;
        let path: PathBuf = path.into();
        let interval = rng.config().auto_update_interval;
        let (err_tx, errors) = mpsc::channel();

        let handle = thread::spawn(move || loop {
            match shutdown.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = rng.write_seed(&path) {
                        tracing::warn!(error = %err, "periodic seed-file refresh failed");
                        let _ = err_tx.send(err);
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if let Err(err) = rng.write_seed(&path) {
                        tracing::warn!(error = %err, "final seed-file refresh failed");
                        let _ = err_tx.send(err);
                    }
                    drop(err_tx);
                    rng.retire();
                    tracing::info!("auto-update task stopped");
                    return;
                }
            }
        });

        AutoUpdateTask { errors, handle }
    }
}
