//! Progressive-overload suggestions derived from logged volume.
//!
//! Rules, per exercise title:
//! - Needs at least two loaded sets (weight and reps) in history
//! - Latest volume above the previous one: increase weight by the configured factor
//! - Latest reps at or above the rep ceiling: increase weight the same way
//! - Otherwise: keep the weight and add reps

use crate::catalog::TemplateCatalog;
use crate::config::{LoadConfig, ProgressionConfig};
use crate::{ExerciseTemplate, WeightSource, WorkoutSession};
use serde::Serialize;
use std::collections::HashMap;

/// Coaching note for exercises without any usable history
pub const DEFAULT_NOTE: &str = "Start moderate and build";

/// What to do next time for an exercise
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    IncreaseWeight { to_kg: f64 },
    MaintainOrAddReps,
}

/// Volume trend for one exercise
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProgressionRecord {
    pub title: String,
    pub last_volume: f64,
    pub previous_volume: f64,
    pub last_weight_kg: f64,
    pub last_reps: u32,
    pub suggestion: Suggestion,
}

impl ProgressionRecord {
    pub fn is_increase(&self) -> bool {
        matches!(self.suggestion, Suggestion::IncreaseWeight { .. })
    }

    /// Weight to prescribe next session
    pub fn target_weight_kg(&self) -> f64 {
        match self.suggestion {
            Suggestion::IncreaseWeight { to_kg } => to_kg,
            Suggestion::MaintainOrAddReps => self.last_weight_kg,
        }
    }

    /// Reps to prescribe next session
    pub fn target_reps(&self, config: &ProgressionConfig) -> u32 {
        match self.suggestion {
            Suggestion::IncreaseWeight { .. } => self.last_reps.min(config.rep_ceiling).max(1),
            Suggestion::MaintainOrAddReps => self.last_reps + 1,
        }
    }

    pub fn note(&self) -> String {
        match self.suggestion {
            Suggestion::IncreaseWeight { to_kg } => format!(
                "Progress: increase weight to {}kg (last {}kg x {})",
                to_kg, self.last_weight_kg, self.last_reps
            ),
            Suggestion::MaintainOrAddReps => format!(
                "Maintain {}kg and add reps (last {} reps)",
                self.last_weight_kg, self.last_reps
            ),
        }
    }
}

/// Round to the nearest loadable increment
pub fn round_to_increment(kg: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return kg;
    }
    (kg / increment).round() * increment
}

/// Decide the suggestion from the two most recent loaded sets
pub fn suggest(
    last_volume: f64,
    previous_volume: f64,
    last_weight_kg: f64,
    last_reps: u32,
    config: &ProgressionConfig,
) -> Suggestion {
    if last_volume > previous_volume || last_reps >= config.rep_ceiling {
        let mut to_kg = round_to_increment(
            last_weight_kg * config.increase_factor,
            config.rounding_increment_kg,
        );
        // Light loads can round back down to where they started
        if last_weight_kg > 0.0 && to_kg <= last_weight_kg {
            to_kg = last_weight_kg + config.rounding_increment_kg.max(0.0);
        }
        Suggestion::IncreaseWeight { to_kg }
    } else {
        Suggestion::MaintainOrAddReps
    }
}

/// Key used for progression lookups by title
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Build progression records from sessions ordered newest first
pub fn build_progression(
    sessions: &[&WorkoutSession],
    config: &ProgressionConfig,
) -> HashMap<String, ProgressionRecord> {
    // title key -> (display title, up to two newest loaded sets as (weight, reps))
    let mut latest: HashMap<String, (String, Vec<(f64, u32)>)> = HashMap::new();

    for session in sessions {
        for exercise in &session.exercises {
            let entry = latest
                .entry(title_key(&exercise.title))
                .or_insert_with(|| (exercise.title.clone(), Vec::new()));
            for set in exercise.sets.iter().rev() {
                if entry.1.len() >= 2 {
                    break;
                }
                if let (Some(weight), Some(reps)) = (set.weight_kg, set.reps) {
                    entry.1.push((weight, reps));
                }
            }
        }
    }

    latest
        .into_iter()
        .filter_map(|(key, (title, sets))| {
            if sets.len() < 2 {
                return None;
            }
            let (last_weight_kg, last_reps) = sets[0];
            let (prev_weight, prev_reps) = sets[1];
            let last_volume = last_weight_kg * f64::from(last_reps);
            let previous_volume = prev_weight * f64::from(prev_reps);
            let suggestion = suggest(
                last_volume,
                previous_volume,
                last_weight_kg,
                last_reps,
                config,
            );
            Some((
                key,
                ProgressionRecord {
                    title,
                    last_volume,
                    previous_volume,
                    last_weight_kg,
                    last_reps,
                    suggestion,
                },
            ))
        })
        .collect()
}

/// Resolve the starting weight for a template
///
/// Order: own record, a record borrowed from a template with the same
/// primary muscle group and equipment, then the equipment default.
pub fn resolve_load(
    template: &ExerciseTemplate,
    catalog: &TemplateCatalog,
    progression: &HashMap<String, ProgressionRecord>,
    loads: &LoadConfig,
) -> (f64, WeightSource) {
    if let Some(record) = progression.get(&title_key(&template.title)) {
        return (record.target_weight_kg().max(0.0), WeightSource::History);
    }

    let borrowed = catalog
        .for_muscle(&template.primary_muscle_group)
        .filter(|other| other.id != template.id && other.equipment == template.equipment)
        .find_map(|other| {
            progression
                .get(&title_key(&other.title))
                .map(|record| (other, record))
        });

    if let Some((other, record)) = borrowed {
        tracing::debug!(
            "Borrowing load for {} from {}",
            template.title,
            other.title
        );
        return (
            record.target_weight_kg().max(0.0),
            WeightSource::Borrowed {
                from: other.title.clone(),
            },
        );
    }

    let default = loads.default_for(template.equipment);
    if default > 0.0 {
        (default, WeightSource::EquipmentDefault)
    } else {
        (0.0, WeightSource::Unloaded)
    }
}
