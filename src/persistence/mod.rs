//! Seed-file persistence.
//!
//! The seed file is a fixed-length opaque blob of generator output used to
//! carry PRNG state across restarts. Writing always produces a fresh blob,
//! and loading one immediately rotates the file, so a blob on disk is never
//! consumed twice.

mod updater;

pub use updater::AutoUpdateTask;

use std::fs;
use std::io::Write;
use std::path::Path;

use zeroize::Zeroizing;

use crate::accumulator::Fortuna;
use crate::error::Error;

/// Exact length of the on-disk seed blob, in bytes.
pub const SEED_FILE_LENGTH: usize = 64;

impl Fortuna {
    /// Draws a fresh seed blob that can later restore PRNG state through
    /// [`read_seed`](Self::read_seed).
    ///
    /// Fails with [`Error::NotSeeded`] before the first reseed.
    pub fn seed(&self) -> Result<Zeroizing<[u8; SEED_FILE_LENGTH]>, Error> {
        if !self.initialised() {
            return Err(Error::NotInitialised);
        }
        let mut blob = Zeroizing::new([0u8; SEED_FILE_LENGTH]);
        self.read_bytes(blob.as_mut_slice())?;
        Ok(blob)
    }

    /// Writes a fresh seed blob to `path`, truncating any prior file.
    ///
    /// The file is created with owner-only permissions on Unix.
    pub fn write_seed(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let blob = self.seed()?;
        write_private(path, blob.as_slice())?;
        tracing::debug!(path = %path.display(), "seed file written");
        Ok(())
    }

    /// Rotates the seed file at `path`.
    ///
    /// Reads the existing blob, folds it into the generator, and replaces
    /// the file with fresh output. Fails with [`Error::InvalidSeed`] if the
    /// file does not hold exactly [`SEED_FILE_LENGTH`] bytes.
    pub fn update_seed(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        if !self.initialised() {
            return Err(Error::NotInitialised);
        }
        let path = path.as_ref();
        let blob = Zeroizing::new(fs::read(path)?);
        self.read_seed(&blob)?;
        self.write_seed(path)
    }

    /// Restores generator state from a seed blob read from a seed file.
    ///
    /// Counts as a reseed, so the instance becomes usable without waiting
    /// for live entropy.
    pub fn read_seed(&self, blob: &[u8]) -> Result<(), Error> {
        if blob.len() != SEED_FILE_LENGTH {
            return Err(Error::InvalidSeed {
                expected: SEED_FILE_LENGTH,
                got: blob.len(),
            });
        }
        self.absorb_seed(blob);
        tracing::info!("generator state restored from seed");
        Ok(())
    }

    /// Constructs a new instance restored from the seed file at `path`.
    pub fn from_seed(path: impl AsRef<Path>) -> Result<Self, Error> {
        let blob = Zeroizing::new(fs::read(path.as_ref())?);
        let rng = Self::new();
        rng.read_seed(&blob)?;
        Ok(rng)
    }
}

/// Writes `bytes` to `path`, truncating, with mode `0600` on Unix.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)
}
