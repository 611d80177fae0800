//! Local cache of the last successfully fetched routine list.
//!
//! Only used to decide whether a remote routine id can be trusted, never as
//! a primary source of routines.

use crate::state::{load_json, save_json};
use crate::{RemoteRoutine, Result};
use std::path::{Path, PathBuf};

pub struct RoutineCache {
    path: PathBuf,
}

impl RoutineCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached routines; empty if the cache is missing or unreadable
    pub fn load(&self) -> Vec<RemoteRoutine> {
        load_json::<Vec<RemoteRoutine>>(&self.path).unwrap_or_default()
    }

    pub fn store(&self, routines: &[RemoteRoutine]) -> Result<()> {
        save_json(&self.path, &routines)?;
        tracing::debug!("Cached {} routines at {:?}", routines.len(), self.path);
        Ok(())
    }
}
