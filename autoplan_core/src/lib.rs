#![forbid(unsafe_code)]

//! Core domain model and business logic for the Autoplan engine.
//!
//! This crate provides:
//! - Domain types (sessions, templates, splits, routine payloads)
//! - History analysis and progression suggestions
//! - Split scheduling and exercise selection
//! - Routine assembly
//! - Remote routine sync with retry, plus the HTTP client
//! - Persistence (split assignment, routine cache)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod state;
pub mod history;
pub mod progression;
pub mod scheduler;
pub mod selector;
pub mod routine;
pub mod remote;
pub mod retry;
pub mod http;
pub mod export;
pub mod cache;
pub mod sync;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::TemplateCatalog;
pub use config::Config;
pub use history::{analyze, HistoryAnalysis};
pub use scheduler::{choose_split, ScheduleDecision, ScheduleReason};
pub use remote::{RemoteError, RoutineStore, WorkoutSource};
pub use retry::RetryPolicy;
pub use http::TrackerClient;
pub use export::ExportDirSource;
pub use cache::RoutineCache;
pub use sync::{RoutineSynchronizer, SyncAction, SyncOutcome};
pub use engine::{Autoplanner, Plan, PlanOptions, RunReport, StatusReport, TodaysWorkout};
