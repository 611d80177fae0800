//! Offline workout source backed by an export directory.
//!
//! The directory holds `workouts.json` (a list of sessions, or an object
//! with a `workouts` list) and `exercise_templates.json` (likewise with an
//! `exercise_templates` list), in the same shape the REST API returns.

use crate::remote::WorkoutSource;
use crate::{Error, ExerciseTemplate, Result, WorkoutSession};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const WORKOUTS_FILE: &str = "workouts.json";
pub const TEMPLATES_FILE: &str = "exercise_templates.json";

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Workouts { workouts: Vec<T> },
    Templates { exercise_templates: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Workouts { workouts } => workouts,
            Listing::Templates { exercise_templates } => exercise_templates,
        }
    }
}

pub struct ExportDirSource {
    dir: PathBuf,
}

impl ExportDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_listing<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            tracing::warn!("Export file {:?} not found, treating as empty", path);
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        let listing: Listing<T> = serde_json::from_str(&contents)
            .map_err(|e| Error::Other(format!("Failed to parse {:?}: {}", path, e)))?;
        Ok(listing.into_vec())
    }
}

#[async_trait]
impl WorkoutSource for ExportDirSource {
    async fn recent_workouts(&self, limit: usize) -> Result<Vec<WorkoutSession>> {
        let mut sessions: Vec<WorkoutSession> = self.read_listing(WORKOUTS_FILE)?;
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        tracing::debug!("Loaded {} sessions from {:?}", sessions.len(), self.dir);
        Ok(sessions)
    }

    async fn exercise_templates(&self) -> Result<Vec<ExerciseTemplate>> {
        self.read_listing(TEMPLATES_FILE)
    }
}
