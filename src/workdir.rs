//! Scoped working-directory changes.
//!
//! The process working directory is shared by everything in the process.
//! [`ChangeDir`] switches it and puts the previous directory back when the
//! guard is dropped, whether the scope ends normally, through `?`, or by
//! unwinding.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Guard restoring the previous working directory on drop.
#[derive(Debug)]
pub struct ChangeDir {
    previous: PathBuf,
}

impl ChangeDir {
    pub fn enter(path: &Path) -> Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(path)?;
        log::debug!("entered {}", path.display());
        Ok(Self { previous })
    }

    /// The directory that will be restored.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for ChangeDir {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            log::warn!(
                "could not restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}

/// Run `f` with `path` as the working directory.
pub fn in_dir<T>(path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let _guard = ChangeDir::enter(path)?;
    f()
}
