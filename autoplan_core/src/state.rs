//! Flat-file persistence with file locking.
//!
//! Used for the split assignment that survives between runs and for the
//! routine cache. Reads treat a missing or corrupt file as absent; writes go
//! through a locked temp file that is atomically renamed into place.

use crate::{Error, Result, SplitAssignment};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a JSON document with shared locking
///
/// Returns `None` if the file doesn't exist, can't be read or can't be parsed.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        tracing::debug!("No file found at {:?}", path);
        return None;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Ignoring.", path, e);
            return None;
        }
    };

    // Acquire shared lock for reading
    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Ignoring.", path, e);
        return None;
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    let read = reader.read_to_string(&mut contents);
    let _ = file.unlock();
    if let Err(e) = read {
        tracing::warn!("Failed to read {:?}: {}. Ignoring.", path, e);
        return None;
    }

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {:?}", path);
            Some(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Ignoring.", path, e);
            None
        }
    }
}

/// Save a JSON document atomically with exclusive locking
///
/// Atomically writes by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::State(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;

    // Acquire exclusive lock on the temp file to serialize concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {:?}", path);
    Ok(())
}

impl SplitAssignment {
    /// Load the previous assignment, if any
    pub fn load(path: &Path) -> Option<Self> {
        let assignment = load_json::<SplitAssignment>(path);
        if assignment.is_none() {
            tracing::info!("No previous split assignment, starting fresh");
        }
        assignment
    }

    /// Persist this assignment, replacing the previous one
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)?;
        tracing::info!("Persisted split assignment: {} at {}", self.split, self.assigned_at);
        Ok(())
    }
}
