//! Core domain types for the Autoplan engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout history as reported by the tracking service
//! - Exercise templates and their equipment categories
//! - Training splits and the persisted split assignment
//! - Exercise picks and the routine payload sent back to the service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Workout History
// ============================================================================

/// A single logged set
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
}

impl SetRecord {
    /// A set counts towards statistics only with weight and reps, or a duration.
    pub fn is_quantifiable(&self) -> bool {
        (self.weight_kg.is_some() && self.reps.is_some()) || self.duration_seconds.is_some()
    }

    /// Training volume (weight x reps), present only for loaded rep sets
    pub fn volume(&self) -> Option<f64> {
        match (self.weight_kg, self.reps) {
            (Some(weight), Some(reps)) => Some(weight * f64::from(reps)),
            _ => None,
        }
    }
}

/// One exercise as performed within a session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExercisePerformance {
    pub title: String,
    #[serde(default)]
    pub exercise_template_id: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// A logged workout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub exercises: Vec<ExercisePerformance>,
}

// ============================================================================
// Exercise Templates
// ============================================================================

/// Equipment category of an exercise template
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    None,
    Barbell,
    Dumbbell,
    Kettlebell,
    Machine,
    Plate,
    ResistanceBand,
    Suspension,
    #[serde(other)]
    Other,
}

impl Equipment {
    pub fn is_bodyweight(self) -> bool {
        matches!(self, Equipment::None | Equipment::Suspension)
    }
}

/// An exercise from the tracking service's catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub id: String,
    pub title: String,
    pub primary_muscle_group: String,
    #[serde(default = "default_equipment")]
    pub equipment: Equipment,
}

fn default_equipment() -> Equipment {
    Equipment::Other
}

// ============================================================================
// Splits
// ============================================================================

/// A muscle-group training split
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Push,
    Pull,
    Legs,
    Core,
    Cardio,
}

impl Split {
    /// All splits in rotation order; ties are broken by this order.
    pub const ALL: [Split; 5] = [
        Split::Push,
        Split::Pull,
        Split::Legs,
        Split::Core,
        Split::Cardio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Split::Push => "Push",
            Split::Pull => "Pull",
            Split::Legs => "Legs",
            Split::Core => "Core",
            Split::Cardio => "Cardio",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Split {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(Split::Push),
            "pull" => Ok(Split::Pull),
            "legs" | "leg" => Ok(Split::Legs),
            "core" | "abs" => Ok(Split::Core),
            "cardio" => Ok(Split::Cardio),
            other => Err(crate::Error::Other(format!("Unknown split: {}", other))),
        }
    }
}

/// The split scheduled for a day, persisted between runs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SplitAssignment {
    pub split: Split,
    pub assigned_at: DateTime<Utc>,
}

// ============================================================================
// Selection and Routine Payload
// ============================================================================

/// Where a pick's starting weight came from
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightSource {
    /// The exercise's own progression record
    History,
    /// Borrowed from a similar exercise (same muscle group and equipment)
    Borrowed { from: String },
    /// Conservative equipment default
    EquipmentDefault,
    /// Bodyweight or duration-based, no external load
    Unloaded,
}

/// An exercise chosen for today's routine
#[derive(Clone, Debug, Serialize)]
pub struct ExercisePick {
    pub template: ExerciseTemplate,
    pub note: String,
    pub weight_kg: f64,
    pub target_reps: u32,
    pub weight_source: WeightSource,
}

/// Type of a planned set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    Warmup,
    Normal,
}

/// A set planned in the routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedSet {
    #[serde(rename = "type")]
    pub set_type: SetType,
    pub weight_kg: Option<f64>,
    pub reps: Option<u32>,
    pub duration_seconds: Option<u32>,
}

/// One exercise entry in the routine payload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineExerciseEntry {
    pub exercise_template_id: String,
    pub superset_id: Option<u32>,
    pub rest_seconds: u32,
    pub notes: String,
    pub sets: Vec<PlannedSet>,
    /// Display title, not sent to the remote service
    #[serde(skip)]
    pub title: String,
}

/// The routine body submitted to the remote service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutinePayload {
    pub title: String,
    pub notes: String,
    pub exercises: Vec<RoutineExerciseEntry>,
}

/// Summary of an exercise inside a remote routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RemoteRoutineExercise {
    #[serde(default)]
    pub exercise_template_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A routine as known to the remote service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RemoteRoutine {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<RemoteRoutineExercise>,
}
