//! Interfaces to the external workout-tracking service.
//!
//! The engine only talks to these traits; `http::TrackerClient` implements
//! them against the real API and `export::ExportDirSource` reads an offline
//! export.

use crate::{ExerciseTemplate, RemoteRoutine, Result, RoutinePayload, WorkoutSession};
use async_trait::async_trait;

/// Failure talking to the routine store
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, timeout or other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Rate limits and server errors are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// One page of routines
#[derive(Clone, Debug, Default)]
pub struct RoutinePage {
    pub page: u32,
    pub page_count: u32,
    pub routines: Vec<RemoteRoutine>,
}

/// Source of workout history and the exercise template catalog
#[async_trait]
pub trait WorkoutSource: Send + Sync {
    /// Most recent sessions, newest first, at most `limit`
    async fn recent_workouts(&self, limit: usize) -> Result<Vec<WorkoutSession>>;

    /// The complete template catalog
    async fn exercise_templates(&self) -> Result<Vec<ExerciseTemplate>>;
}

/// Remote store of routines
#[async_trait]
pub trait RoutineStore: Send + Sync {
    /// List one page of routines (pages start at 1)
    async fn list_routines(
        &self,
        page: u32,
        page_size: u32,
    ) -> std::result::Result<RoutinePage, RemoteError>;

    async fn create_routine(
        &self,
        payload: &RoutinePayload,
    ) -> std::result::Result<RemoteRoutine, RemoteError>;

    async fn update_routine(
        &self,
        id: &str,
        payload: &RoutinePayload,
    ) -> std::result::Result<RemoteRoutine, RemoteError>;
}
