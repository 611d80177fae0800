//! Routine payload assembly.
//!
//! Entries are placed in this order:
//! 1. Supersets: strength pick `i` paired with abs pick `i`
//! 2. Unpaired strength picks as solo entries
//! 3. One remaining abs pick as a finisher, if there is room
//! 4. Padding from any still unused pick up to the minimum size
//!
//! The result is then truncated to the maximum size and deduplicated by
//! template id.

use crate::catalog::is_duration_based;
use crate::config::RoutineConfig;
use crate::{
    Error, ExercisePick, PlannedSet, Result, RoutineExerciseEntry, RoutinePayload, SetType, Split,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Planned sets for one pick
pub fn planned_sets(pick: &ExercisePick, config: &RoutineConfig) -> Vec<PlannedSet> {
    let template = &pick.template;

    if template.primary_muscle_group == "cardio" {
        return vec![PlannedSet {
            set_type: SetType::Normal,
            weight_kg: None,
            reps: None,
            duration_seconds: Some(config.cardio_seconds),
        }];
    }

    let set = if is_duration_based(template) {
        PlannedSet {
            set_type: SetType::Normal,
            weight_kg: None,
            reps: None,
            duration_seconds: Some(config.hold_seconds),
        }
    } else {
        let reps = if pick.target_reps > 0 {
            pick.target_reps
        } else {
            config.default_reps
        };
        PlannedSet {
            set_type: SetType::Normal,
            weight_kg: Some(pick.weight_kg.max(0.0)),
            reps: Some(reps),
            duration_seconds: None,
        }
    };
    vec![set; config.sets_per_exercise.max(1) as usize]
}

fn entry(
    pick: &ExercisePick,
    superset_id: Option<u32>,
    rest_seconds: u32,
    notes: String,
    config: &RoutineConfig,
) -> RoutineExerciseEntry {
    RoutineExerciseEntry {
        exercise_template_id: pick.template.id.clone(),
        superset_id,
        rest_seconds,
        notes,
        sets: planned_sets(pick, config),
        title: pick.template.title.clone(),
    }
}

/// Build the routine payload for a split
///
/// Fails with `Error::Selection` when there is nothing to put in it.
pub fn build_routine(
    strength: &[ExercisePick],
    abs: &[ExercisePick],
    split: Split,
    config: &RoutineConfig,
    now: DateTime<Utc>,
) -> Result<RoutinePayload> {
    let shape = config.shape_for(split);
    let mut exercises: Vec<RoutineExerciseEntry> = Vec::new();
    let mut used: HashSet<&str> = HashSet::new();

    // Supersets
    let pairs = shape.max_supersets.min(strength.len()).min(abs.len());
    for (i, (main, finisher)) in strength.iter().zip(abs).take(pairs).enumerate() {
        let id = i as u32;
        exercises.push(entry(
            main,
            Some(id),
            config.superset_rest_seconds,
            format!("{} | Superset with {}", main.note, finisher.template.title),
            config,
        ));
        exercises.push(entry(
            finisher,
            Some(id),
            config.superset_rest_seconds,
            format!("{} | Superset with {}", finisher.note, main.template.title),
            config,
        ));
        used.insert(&main.template.id);
        used.insert(&finisher.template.id);
    }

    // Solo strength work
    for pick in &strength[pairs..] {
        exercises.push(entry(pick, None, config.solo_rest_seconds, pick.note.clone(), config));
        used.insert(&pick.template.id);
    }

    // One abs finisher
    let remaining_abs = &abs[pairs..];
    if exercises.len() < shape.max_entries {
        if let Some(pick) = remaining_abs.first() {
            exercises.push(entry(
                pick,
                None,
                config.finisher_rest_seconds,
                format!("{} | Finisher", pick.note),
                config,
            ));
            used.insert(&pick.template.id);
        }
    }

    // Padding
    if exercises.len() < shape.min_entries {
        for pick in remaining_abs.iter().chain(strength) {
            if exercises.len() >= shape.min_entries {
                break;
            }
            if used.insert(&pick.template.id) {
                exercises.push(entry(
                    pick,
                    None,
                    config.finisher_rest_seconds,
                    pick.note.clone(),
                    config,
                ));
            }
        }
    }

    if exercises.len() > shape.max_entries {
        tracing::warn!(
            "Routine has {} entries, truncating to {}",
            exercises.len(),
            shape.max_entries
        );
        exercises.truncate(shape.max_entries);
    }

    let exercises = dedupe(exercises);

    if exercises.is_empty() {
        return Err(Error::Selection(format!(
            "No exercises available for {} day",
            split
        )));
    }

    Ok(RoutinePayload {
        title: config.title_for(split),
        notes: format!(
            "Generated {} for {} day. Progressive overload targets in exercise notes.",
            now.format("%Y-%m-%d"),
            split
        ),
        exercises,
    })
}

/// Drop repeated template ids, then clear superset ids left with one member
fn dedupe(exercises: Vec<RoutineExerciseEntry>) -> Vec<RoutineExerciseEntry> {
    let mut seen = HashSet::new();
    let mut kept: Vec<RoutineExerciseEntry> = Vec::with_capacity(exercises.len());
    for entry in exercises {
        if seen.insert(entry.exercise_template_id.clone()) {
            kept.push(entry);
        } else {
            tracing::warn!(
                "Duplicate template {} ({}) removed from routine",
                entry.exercise_template_id,
                entry.title
            );
        }
    }

    for i in 0..kept.len() {
        if let Some(id) = kept[i].superset_id {
            let members = kept.iter().filter(|e| e.superset_id == Some(id)).count();
            if members < 2 {
                kept[i].superset_id = None;
            }
        }
    }
    kept
}
