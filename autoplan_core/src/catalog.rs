//! Exercise template catalog and the classification tables used to reason
//! about it.
//!
//! Keyword heuristics live here as declarative tables behind named
//! functions so selection and routine building never match strings directly.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Muscle groups trained by each split
static SPLIT_MUSCLES: Lazy<HashMap<Split, &'static [&'static str]>> = Lazy::new(|| {
    let mut map: HashMap<Split, &'static [&'static str]> = HashMap::new();
    map.insert(Split::Push, &["chest", "shoulders", "triceps"]);
    map.insert(
        Split::Pull,
        &["lats", "upper_back", "lower_back", "traps", "biceps", "forearms"],
    );
    map.insert(
        Split::Legs,
        &[
            "quadriceps",
            "hamstrings",
            "glutes",
            "calves",
            "adductors",
            "abductors",
        ],
    );
    map.insert(Split::Core, &["abdominals", "obliques"]);
    map.insert(Split::Cardio, &["cardio", "full_body"]);
    map
});

/// Back muscles are always tried first when ordering muscle groups
const BACK_MUSCLES: &[&str] = &["lats", "upper_back", "lower_back", "traps"];

/// Muscle groups eligible for the abs finisher sub-selection
const ABS_MUSCLES: &[&str] = &["abdominals", "obliques"];

/// Titles that identify real compound leg work on leg day
const COMPOUND_LEG_KEYWORDS: &[&str] = &[
    "squat",
    "lunge",
    "deadlift",
    "leg press",
    "hip thrust",
    "step up",
    "step-up",
    "hack",
    "good morning",
    "romanian",
    "glute bridge",
];

/// Titles that identify genuine core work on core day
const CORE_KEYWORDS: &[&str] = &[
    "crunch",
    "plank",
    "twist",
    "hold",
    "sit up",
    "sit-up",
    "leg raise",
    "knee raise",
    "hollow",
    "v up",
    "v-up",
    "dead bug",
    "ab wheel",
    "rollout",
    "pallof",
    "woodchop",
    "wood chop",
    "flutter",
    "bicycle",
    "toes to bar",
    "l-sit",
    "side bend",
    "mountain climber",
];

/// Titles performed for time rather than reps
const HOLD_KEYWORDS: &[&str] = &[
    "plank",
    "hold",
    "hollow",
    "l-sit",
    "wall sit",
    "dead hang",
    "isometric",
    "static",
];

/// Bodyweight core movements that stay rep-based
const REP_CORE_KEYWORDS: &[&str] = &["crunch", "twist"];

const RECTUS_KEYWORDS: &[&str] = &[
    "crunch",
    "sit up",
    "sit-up",
    "leg raise",
    "knee raise",
    "v up",
    "v-up",
    "toes to bar",
    "rollout",
    "ab wheel",
    "flutter",
];

const OBLIQUE_KEYWORDS: &[&str] = &[
    "twist",
    "oblique",
    "side bend",
    "woodchop",
    "wood chop",
    "bicycle",
    "windshield",
    "pallof",
];

const ISOMETRIC_KEYWORDS: &[&str] = &["plank", "hold", "hollow", "l-sit", "dead bug"];

/// Slot in the abs finisher taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbsSlot {
    Rectus,
    Oblique,
    Isometric,
}

impl AbsSlot {
    pub const ALL: [AbsSlot; 3] = [AbsSlot::Rectus, AbsSlot::Oblique, AbsSlot::Isometric];
}

fn title_matches(title: &str, keywords: &[&str]) -> bool {
    let lower = title.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Muscle groups trained by a split
pub fn muscle_groups_for(split: Split) -> &'static [&'static str] {
    SPLIT_MUSCLES.get(&split).copied().unwrap_or(&[])
}

/// Split a muscle group belongs to, if any
pub fn split_for_muscle(muscle: &str) -> Option<Split> {
    Split::ALL
        .into_iter()
        .find(|split| muscle_groups_for(*split).contains(&muscle))
}

pub fn is_back_muscle(muscle: &str) -> bool {
    BACK_MUSCLES.contains(&muscle)
}

pub fn is_abs_muscle(muscle: &str) -> bool {
    ABS_MUSCLES.contains(&muscle)
}

/// Leg-day filter: keep compound leg patterns, drop accessory noise
pub fn is_compound_leg(template: &ExerciseTemplate) -> bool {
    title_matches(&template.title, COMPOUND_LEG_KEYWORDS)
}

/// Core-day filter: keep exercises whose title names real core work
pub fn is_core_exercise(template: &ExerciseTemplate) -> bool {
    title_matches(&template.title, CORE_KEYWORDS)
}

/// Whether sets for this exercise store seconds rather than reps
pub fn is_duration_based(template: &ExerciseTemplate) -> bool {
    if template.primary_muscle_group == "cardio" {
        return true;
    }
    if title_matches(&template.title, HOLD_KEYWORDS) {
        return true;
    }
    template.equipment.is_bodyweight()
        && is_abs_muscle(&template.primary_muscle_group)
        && !title_matches(&template.title, REP_CORE_KEYWORDS)
}

/// Abs finisher slot for a title; holds win over rotations over rectus work
pub fn abs_slot(title: &str) -> Option<AbsSlot> {
    if title_matches(title, ISOMETRIC_KEYWORDS) {
        Some(AbsSlot::Isometric)
    } else if title_matches(title, OBLIQUE_KEYWORDS) {
        Some(AbsSlot::Oblique)
    } else if title_matches(title, RECTUS_KEYWORDS) {
        Some(AbsSlot::Rectus)
    } else {
        None
    }
}

/// Template catalog with id and title lookups
#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    templates: Vec<ExerciseTemplate>,
    by_id: HashMap<String, usize>,
    by_title: HashMap<String, usize>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<ExerciseTemplate>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_title = HashMap::new();
        for (idx, template) in templates.iter().enumerate() {
            by_id.entry(template.id.clone()).or_insert(idx);
            by_title.entry(template.title.to_lowercase()).or_insert(idx);
        }
        Self {
            templates,
            by_id,
            by_title,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn templates(&self) -> &[ExerciseTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseTemplate> {
        self.by_id.get(id).map(|&idx| &self.templates[idx])
    }

    /// Resolve a performed exercise by template id, falling back to title
    pub fn resolve(&self, performance: &ExercisePerformance) -> Option<&ExerciseTemplate> {
        performance
            .exercise_template_id
            .as_deref()
            .and_then(|id| self.get(id))
            .or_else(|| {
                self.by_title
                    .get(&performance.title.to_lowercase())
                    .map(|&idx| &self.templates[idx])
            })
    }

    /// Templates whose primary muscle group matches
    pub fn for_muscle<'a>(&'a self, muscle: &'a str) -> impl Iterator<Item = &'a ExerciseTemplate> {
        self.templates
            .iter()
            .filter(move |t| t.primary_muscle_group == muscle)
    }

    /// Validate the catalog
    ///
    /// Returns a list of problems (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.by_id.len() != self.templates.len() {
            errors.push(format!(
                "{} duplicate template ids",
                self.templates.len() - self.by_id.len()
            ));
        }

        for template in &self.templates {
            if template.title.trim().is_empty() {
                errors.push(format!("Template {} has an empty title", template.id));
            }
            if template.primary_muscle_group.trim().is_empty() {
                errors.push(format!("Template {} has no primary muscle group", template.id));
            }
        }

        errors
    }
}

#[cfg(test)]
pub(crate) fn template(id: &str, title: &str, muscle: &str, equipment: Equipment) -> ExerciseTemplate {
    ExerciseTemplate {
        id: id.into(),
        title: title.into(),
        primary_muscle_group: muscle.into(),
        equipment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_split_has_muscles() {
        for split in Split::ALL {
            assert!(!muscle_groups_for(split).is_empty(), "{} has no muscles", split);
        }
    }

    #[test]
    fn test_split_for_muscle() {
        assert_eq!(split_for_muscle("chest"), Some(Split::Push));
        assert_eq!(split_for_muscle("lats"), Some(Split::Pull));
        assert_eq!(split_for_muscle("glutes"), Some(Split::Legs));
        assert_eq!(split_for_muscle("abdominals"), Some(Split::Core));
        assert_eq!(split_for_muscle("neck"), None);
    }

    #[test]
    fn test_duration_classification() {
        let plank = template("a", "Plank", "abdominals", Equipment::None);
        let crunch = template("b", "Crunch", "abdominals", Equipment::None);
        let russian = template("c", "Russian Twist (Weighted)", "abdominals", Equipment::Plate);
        let leg_raise = template("d", "Lying Leg Raise", "abdominals", Equipment::None);
        let bench = template("e", "Bench Press (Barbell)", "chest", Equipment::Barbell);
        let bike = template("f", "Cycling", "cardio", Equipment::Machine);

        assert!(is_duration_based(&plank));
        assert!(!is_duration_based(&crunch));
        assert!(!is_duration_based(&russian));
        assert!(is_duration_based(&leg_raise));
        assert!(!is_duration_based(&bench));
        assert!(is_duration_based(&bike));
    }

    #[test]
    fn test_abs_slots() {
        assert_eq!(abs_slot("Plank"), Some(AbsSlot::Isometric));
        assert_eq!(abs_slot("Side Plank Hold"), Some(AbsSlot::Isometric));
        assert_eq!(abs_slot("Russian Twist"), Some(AbsSlot::Oblique));
        assert_eq!(abs_slot("Cable Crunch"), Some(AbsSlot::Rectus));
        assert_eq!(abs_slot("Hip Abduction"), None);
    }

    #[test]
    fn test_leg_and_core_filters() {
        let squat = template("a", "Back Squat (Barbell)", "quadriceps", Equipment::Barbell);
        let adductor = template("b", "Hip Adduction (Machine)", "adductors", Equipment::Machine);
        let stretch = template("c", "Cat Cow", "abdominals", Equipment::None);
        let crunch = template("d", "Decline Crunch", "abdominals", Equipment::None);

        assert!(is_compound_leg(&squat));
        assert!(!is_compound_leg(&adductor));
        assert!(!is_core_exercise(&stretch));
        assert!(is_core_exercise(&crunch));
    }

    #[test]
    fn test_resolve_by_id_then_title() {
        let catalog = TemplateCatalog::new(vec![
            template("T1", "Bench Press (Barbell)", "chest", Equipment::Barbell),
            template("T2", "Pull Up", "lats", Equipment::None),
        ]);

        let by_id = ExercisePerformance {
            title: "Renamed".into(),
            exercise_template_id: Some("T2".into()),
            sets: vec![],
        };
        let by_title = ExercisePerformance {
            title: "bench press (barbell)".into(),
            exercise_template_id: Some("missing".into()),
            sets: vec![],
        };
        let unknown = ExercisePerformance {
            title: "Mystery".into(),
            exercise_template_id: None,
            sets: vec![],
        };

        assert_eq!(catalog.resolve(&by_id).map(|t| t.id.as_str()), Some("T2"));
        assert_eq!(catalog.resolve(&by_title).map(|t| t.id.as_str()), Some("T1"));
        assert!(catalog.resolve(&unknown).is_none());
    }

    #[test]
    fn test_validate_reports_duplicates() {
        let catalog = TemplateCatalog::new(vec![
            template("T1", "Bench Press", "chest", Equipment::Barbell),
            template("T1", "Bench Press Copy", "chest", Equipment::Barbell),
        ]);
        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duplicate"));
    }
}
