//! Exercise selection.
//!
//! Muscle groups are visited round-robin, back muscles first and then the
//! least trained. For each pick the candidate filters are relaxed one tier
//! at a time until something qualifies:
//!
//! | Tier        | 7-day recency | variety limit | split keywords | 24h titles |
//! |-------------|---------------|---------------|----------------|------------|
//! | `Strict`    | enforced      | enforced      | enforced       | excluded   |
//! | `NoRecency` | dropped       | enforced      | enforced       | excluded   |
//! | `NoVariety` | dropped       | dropped       | enforced       | excluded   |
//! | `Any`       | dropped       | dropped       | dropped        | allowed    |
//!
//! Relaxed selection starts at `NoVariety`, so the split keywords still
//! apply unless nothing else is left. Returning fewer picks than requested
//! is a warning, not an error.

use crate::catalog::{
    abs_slot, is_abs_muscle, is_back_muscle, is_compound_leg, is_core_exercise, is_duration_based,
    muscle_groups_for, AbsSlot, TemplateCatalog,
};
use crate::history::HistoryAnalysis;
use crate::progression::{resolve_load, DEFAULT_NOTE};
use crate::{Config, Equipment, ExercisePick, ExerciseTemplate, Split, WeightSource};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Relaxation tier, from strictest to anything-goes
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Strict,
    NoRecency,
    NoVariety,
    Any,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Strict, Tier::NoRecency, Tier::NoVariety, Tier::Any];

    /// Tier the first attempt of each pick uses
    fn first(relaxed: bool) -> Tier {
        if relaxed {
            Tier::NoVariety
        } else {
            Tier::Strict
        }
    }

    fn starting_at(start: Tier) -> impl Iterator<Item = Tier> {
        Self::ALL.into_iter().filter(move |t| *t >= start)
    }
}

/// Picks made so far in one selection
#[derive(Default)]
struct Chosen {
    ids: HashSet<String>,
    equipment: HashSet<Equipment>,
}

impl Chosen {
    fn add(&mut self, template: &ExerciseTemplate) {
        self.ids.insert(template.id.clone());
        self.equipment.insert(template.equipment);
    }
}

pub struct ExerciseSelector<'a> {
    catalog: &'a TemplateCatalog,
    analysis: &'a HistoryAnalysis,
    config: &'a Config,
    now: DateTime<Utc>,
}

impl<'a> ExerciseSelector<'a> {
    pub fn new(
        catalog: &'a TemplateCatalog,
        analysis: &'a HistoryAnalysis,
        config: &'a Config,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            catalog,
            analysis,
            config,
            now,
        }
    }

    /// Muscle groups for a split: back first, then least trained
    pub fn ordered_muscles(&self, split: Split) -> Vec<&'static str> {
        let mut muscles = muscle_groups_for(split).to_vec();
        muscles.sort_by_key(|m| (!is_back_muscle(m), self.analysis.muscle_count(m)));
        muscles
    }

    fn passes_split_filter(&self, template: &ExerciseTemplate, split: Split) -> bool {
        match split {
            Split::Legs => is_compound_leg(template),
            Split::Core => is_core_exercise(template),
            _ => true,
        }
    }

    fn eligible(
        &self,
        template: &ExerciseTemplate,
        split: Split,
        tier: Tier,
        recency_days: i64,
    ) -> bool {
        if tier < Tier::Any {
            if self.analysis.is_recent_title(&template.title) {
                return false;
            }
            if !self.passes_split_filter(template, split) {
                return false;
            }
        }
        if tier < Tier::NoVariety
            && self.analysis.usage(&template.id) >= self.config.selection.variety_max_uses
        {
            return false;
        }
        if tier < Tier::NoRecency {
            let since = self.now - Duration::days(recency_days);
            if self.analysis.performed_since(&template.id, since) {
                return false;
            }
        }
        true
    }

    /// Best candidate among `candidates`: new equipment first, then
    /// exercises with history, then least used, then by title.
    fn best<'t>(
        &self,
        candidates: impl Iterator<Item = &'t ExerciseTemplate>,
        chosen: &Chosen,
    ) -> Option<&'t ExerciseTemplate> {
        candidates.min_by_key(|t| {
            (
                chosen.equipment.contains(&t.equipment),
                self.analysis.progression_for(&t.title).is_none(),
                self.analysis.usage(&t.id),
                t.title.to_lowercase(),
            )
        })
    }

    fn candidate_for_muscle(
        &self,
        muscle: &str,
        split: Split,
        start: Tier,
        chosen: &Chosen,
    ) -> Option<(&'a ExerciseTemplate, Tier)> {
        let catalog = self.catalog;
        Tier::starting_at(start).find_map(|tier| {
            let candidates = catalog.templates().iter().filter(|t| {
                t.primary_muscle_group == muscle
                    && !chosen.ids.contains(&t.id)
                    && self.eligible(t, split, tier, self.config.selection.recency_days)
            });
            self.best(candidates, chosen).map(|t| (t, tier))
        })
    }

    /// Select up to `count` exercises for a split
    ///
    /// `relaxed` starts every pick at `Tier::NoVariety`.
    pub fn select(&self, split: Split, count: usize, relaxed: bool) -> Vec<ExercisePick> {
        let muscles = self.ordered_muscles(split);
        let start = Tier::first(relaxed);
        let mut chosen = Chosen::default();
        let mut picks = Vec::new();

        while picks.len() < count {
            let mut added = false;
            for muscle in &muscles {
                if picks.len() >= count {
                    break;
                }
                if let Some((template, tier)) =
                    self.candidate_for_muscle(muscle, split, start, &chosen)
                {
                    if tier > start {
                        tracing::warn!(
                            "Relaxed selection to {:?} for {} ({})",
                            tier,
                            muscle,
                            template.title
                        );
                    }
                    chosen.add(template);
                    picks.push(self.make_pick(template));
                    added = true;
                }
            }
            if !added {
                break;
            }
        }

        if picks.len() < count {
            tracing::warn!(
                "Only {} of {} exercises available for {} day",
                picks.len(),
                count,
                split
            );
        }
        tracing::info!(
            "Selected for {}: {:?}",
            split,
            picks.iter().map(|p| p.template.title.as_str()).collect::<Vec<_>>()
        );
        picks
    }

    fn abs_candidate(
        &self,
        slot: Option<AbsSlot>,
        start: Tier,
        chosen: &Chosen,
    ) -> Option<(&'a ExerciseTemplate, Tier)> {
        let catalog = self.catalog;
        let recency = self.config.selection.abs_recency_days;
        Tier::starting_at(start).find_map(|tier| {
            let candidates = catalog.templates().iter().filter(|t| {
                is_abs_muscle(&t.primary_muscle_group)
                    && !chosen.ids.contains(&t.id)
                    && slot.map_or(true, |s| abs_slot(&t.title) == Some(s))
                    && self.eligible(t, Split::Core, tier, recency)
            });
            self.best(candidates, chosen).map(|t| (t, tier))
        })
    }

    /// Select abs finishers, cycling rectus, oblique and isometric slots
    ///
    /// Templates in `exclude` (by id) are never picked.
    pub fn select_abs_finishers(
        &self,
        count: usize,
        exclude: &HashSet<String>,
        relaxed: bool,
    ) -> Vec<ExercisePick> {
        let start = Tier::first(relaxed);
        let mut chosen = Chosen {
            ids: exclude.clone(),
            equipment: HashSet::new(),
        };
        let mut picks = Vec::new();

        for slot in AbsSlot::ALL.into_iter().cycle().take(count) {
            let found = self
                .abs_candidate(Some(slot), start, &chosen)
                .or_else(|| self.abs_candidate(None, start, &chosen));
            let Some((template, tier)) = found else {
                break;
            };
            if tier > start {
                tracing::warn!("Relaxed abs finisher to {:?} ({})", tier, template.title);
            }
            chosen.add(template);
            picks.push(self.make_pick(template));
        }

        if picks.len() < count {
            tracing::warn!("Only {} of {} abs finishers available", picks.len(), count);
        }
        picks
    }

    fn make_pick(&self, template: &ExerciseTemplate) -> ExercisePick {
        let record = self.analysis.progression_for(&template.title);

        if is_duration_based(template) {
            return ExercisePick {
                template: template.clone(),
                note: record.map_or_else(|| DEFAULT_NOTE.to_string(), |r| r.note()),
                weight_kg: 0.0,
                target_reps: 0,
                weight_source: WeightSource::Unloaded,
            };
        }

        let (weight_kg, weight_source) = resolve_load(
            template,
            self.catalog,
            &self.analysis.progression,
            &self.config.loads,
        );
        let note = match (record, &weight_source) {
            (Some(record), _) => record.note(),
            (None, WeightSource::Borrowed { from }) => {
                format!("{} (load from {})", DEFAULT_NOTE, from)
            }
            (None, _) => DEFAULT_NOTE.to_string(),
        };
        let target_reps = record
            .map(|r| r.target_reps(&self.config.progression))
            .unwrap_or(self.config.routine.default_reps);

        ExercisePick {
            template: template.clone(),
            note,
            weight_kg,
            target_reps,
            weight_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::template;
    use crate::history::analyze;
    use crate::history::test_support::*;
    use crate::WorkoutSession;

    fn push_catalog() -> TemplateCatalog {
        TemplateCatalog::new(vec![
            template("bench", "Bench Press (Barbell)", "chest", Equipment::Barbell),
            template("incline", "Incline Press (Dumbbell)", "chest", Equipment::Dumbbell),
            template("fly", "Chest Fly (Machine)", "chest", Equipment::Machine),
            template("ohp", "Overhead Press (Barbell)", "shoulders", Equipment::Barbell),
            template("lateral", "Lateral Raise (Dumbbell)", "shoulders", Equipment::Dumbbell),
            template("pushdown", "Triceps Pushdown (Cable)", "triceps", Equipment::Machine),
            template("dips", "Triceps Dip", "triceps", Equipment::None),
        ])
    }

    fn analysis_for(
        catalog: &TemplateCatalog,
        sessions: &[WorkoutSession],
        now: DateTime<Utc>,
    ) -> HistoryAnalysis {
        analyze(sessions, catalog, now, &Config::default())
    }

    #[test]
    fn test_no_duplicate_ids() {
        let catalog = push_catalog();
        let now = Utc::now();
        let analysis = analysis_for(&catalog, &[], now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let picks = selector.select(Split::Push, 6, false);
        assert_eq!(picks.len(), 6);
        let ids: HashSet<_> = picks.iter().map(|p| p.template.id.clone()).collect();
        assert_eq!(ids.len(), picks.len());

        // Asking for more than exists under-fills instead of repeating
        let picks = selector.select(Split::Push, 20, false);
        assert_eq!(picks.len(), catalog.len());
    }

    #[test]
    fn test_recent_titles_excluded_until_exhausted() {
        let catalog = TemplateCatalog::new(vec![
            template("bench", "Bench Press (Barbell)", "chest", Equipment::Barbell),
            template("incline", "Incline Press (Dumbbell)", "chest", Equipment::Dumbbell),
        ]);
        let now = Utc::now();
        let sessions = vec![session(
            "today",
            now - Duration::hours(3),
            vec![performance("Bench Press (Barbell)", "bench", vec![loaded(60.0, 8)])],
        )];
        let analysis = analysis_for(&catalog, &sessions, now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let one = selector.select(Split::Push, 1, false);
        assert_eq!(one[0].template.id, "incline");

        // Only once nothing else remains does the recent title come back
        let two = selector.select(Split::Push, 2, false);
        assert_eq!(two[0].template.id, "incline");
        assert_eq!(two[1].template.id, "bench");
    }

    #[test]
    fn test_recency_and_variety_filters() {
        let catalog = push_catalog();
        let now = Utc::now();
        let sessions: Vec<_> = (2..5)
            .map(|d| {
                session(
                    &format!("s{}", d),
                    now - Duration::days(d),
                    vec![performance("Chest Fly (Machine)", "fly", vec![loaded(30.0, 12)])],
                )
            })
            .collect();
        let analysis = analysis_for(&catalog, &sessions, now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let picks = selector.select(Split::Push, 3, false);
        assert!(picks.iter().all(|p| p.template.id != "fly"));
    }

    #[test]
    fn test_leg_day_prefers_compound_patterns() {
        let catalog = TemplateCatalog::new(vec![
            template("curl", "Leg Curl (Machine)", "hamstrings", Equipment::Machine),
            template("rdl", "Romanian Deadlift (Barbell)", "hamstrings", Equipment::Barbell),
            template("squat", "Squat (Barbell)", "quadriceps", Equipment::Barbell),
            template("ext", "Leg Extension (Machine)", "quadriceps", Equipment::Machine),
        ]);
        let now = Utc::now();
        let analysis = analysis_for(&catalog, &[], now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let picks = selector.select(Split::Legs, 2, false);
        let ids: Vec<_> = picks.iter().map(|p| p.template.id.as_str()).collect();
        assert!(ids.contains(&"squat"));
        assert!(ids.contains(&"rdl"));
    }

    #[test]
    fn test_back_muscles_first_on_pull_day() {
        let catalog = TemplateCatalog::new(vec![
            template("curl", "Bicep Curl (Dumbbell)", "biceps", Equipment::Dumbbell),
            template("row", "Bent Over Row (Barbell)", "upper_back", Equipment::Barbell),
        ]);
        let now = Utc::now();
        let analysis = analysis_for(&catalog, &[], now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let muscles = selector.ordered_muscles(Split::Pull);
        assert!(is_back_muscle(muscles[0]));
        let picks = selector.select(Split::Pull, 1, false);
        assert_eq!(picks[0].template.id, "row");
    }

    #[test]
    fn test_picks_carry_progression_and_defaults() {
        let catalog = push_catalog();
        let now = Utc::now();
        let sessions = vec![
            session(
                "a",
                now - Duration::days(10),
                vec![performance("Bench Press (Barbell)", "bench", vec![loaded(45.0, 8)])],
            ),
            session(
                "b",
                now - Duration::days(8),
                vec![performance("Bench Press (Barbell)", "bench", vec![loaded(50.0, 8)])],
            ),
        ];
        let analysis = analysis_for(&catalog, &sessions, now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let picks = selector.select(Split::Push, 7, false);
        let bench = picks.iter().find(|p| p.template.id == "bench").unwrap();
        assert_eq!(bench.weight_kg, 52.5);
        assert_eq!(bench.weight_source, WeightSource::History);
        assert!(bench.note.contains("52.5"));

        let dips = picks.iter().find(|p| p.template.id == "dips").unwrap();
        assert_eq!(dips.weight_kg, 0.0);
        assert_eq!(dips.weight_source, WeightSource::Unloaded);

        let lateral = picks.iter().find(|p| p.template.id == "lateral").unwrap();
        assert_eq!(lateral.weight_source, WeightSource::EquipmentDefault);
        assert_eq!(lateral.note, DEFAULT_NOTE);
    }

    #[test]
    fn test_abs_finishers_cover_slots() {
        let catalog = TemplateCatalog::new(vec![
            template("crunch", "Crunch", "abdominals", Equipment::None),
            template("cable", "Cable Crunch", "abdominals", Equipment::Machine),
            template("twist", "Russian Twist", "obliques", Equipment::None),
            template("plank", "Plank", "abdominals", Equipment::None),
        ]);
        let now = Utc::now();
        let analysis = analysis_for(&catalog, &[], now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let exclude: HashSet<String> = ["cable".to_string()].into_iter().collect();
        let picks = selector.select_abs_finishers(3, &exclude, false);
        let slots: Vec<_> = picks.iter().map(|p| abs_slot(&p.template.title)).collect();
        assert_eq!(
            slots,
            vec![
                Some(AbsSlot::Rectus),
                Some(AbsSlot::Oblique),
                Some(AbsSlot::Isometric)
            ]
        );
        assert!(picks.iter().all(|p| p.template.id != "cable"));

        let plank = picks.iter().find(|p| p.template.id == "plank").unwrap();
        assert_eq!(plank.weight_source, WeightSource::Unloaded);
    }

    #[test]
    fn test_relaxed_mode_ignores_recency() {
        let catalog = TemplateCatalog::new(vec![template(
            "bench",
            "Bench Press (Barbell)",
            "chest",
            Equipment::Barbell,
        )]);
        let now = Utc::now();
        let sessions = vec![session(
            "yesterday",
            now - Duration::days(2),
            vec![performance("Bench Press (Barbell)", "bench", vec![loaded(60.0, 8)])],
        )];
        let analysis = analysis_for(&catalog, &sessions, now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        assert_eq!(selector.select(Split::Push, 1, true).len(), 1);
    }

    #[test]
    fn test_relaxed_mode_keeps_leg_day_keywords() {
        let catalog = TemplateCatalog::new(vec![
            template("squat", "Squat (Barbell)", "quadriceps", Equipment::Barbell),
            template("ext", "Leg Extension (Machine)", "quadriceps", Equipment::Machine),
            template("curl", "Leg Curl (Machine)", "hamstrings", Equipment::Machine),
        ]);
        let now = Utc::now();
        let analysis = analysis_for(&catalog, &[], now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        // By title alone the extension would sort ahead of the squat
        let picks = selector.select(Split::Legs, 1, true);
        assert_eq!(picks[0].template.id, "squat");

        // Isolation work still fills the routine once compounds run out
        let picks = selector.select(Split::Legs, 3, true);
        let ids: Vec<_> = picks.iter().map(|p| p.template.id.as_str()).collect();
        assert_eq!(ids, vec!["squat", "curl", "ext"]);
    }

    #[test]
    fn test_abs_finishers_use_shorter_recency_window() {
        let catalog = TemplateCatalog::new(vec![
            template("ab_crunch", "Ab Crunch", "abdominals", Equipment::None),
            template("crunch", "Crunch", "abdominals", Equipment::None),
        ]);
        let now = Utc::now();
        let sessions = vec![
            session(
                "four",
                now - Duration::days(4),
                vec![performance("Ab Crunch", "ab_crunch", vec![loaded(0.0, 20)])],
            ),
            session(
                "six",
                now - Duration::days(6),
                vec![performance("Crunch", "crunch", vec![loaded(0.0, 20)])],
            ),
        ];
        let analysis = analysis_for(&catalog, &sessions, now);
        let config = Config::default();
        assert!(config.selection.abs_recency_days < 6);
        assert!(config.selection.recency_days > 6);
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let picks = selector.select_abs_finishers(1, &HashSet::new(), false);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].template.id, "crunch");
    }

    #[test]
    fn test_unused_equipment_beats_title_order() {
        let catalog = TemplateCatalog::new(vec![
            template("bench", "Bench Press (Barbell)", "chest", Equipment::Barbell),
            template("landmine", "Landmine Press", "shoulders", Equipment::Barbell),
            template("lateral", "Lateral Raise (Dumbbell)", "shoulders", Equipment::Dumbbell),
        ]);
        let now = Utc::now();
        let analysis = analysis_for(&catalog, &[], now);
        let config = Config::default();
        let selector = ExerciseSelector::new(&catalog, &analysis, &config, now);

        let picks = selector.select(Split::Push, 2, false);
        let ids: Vec<_> = picks.iter().map(|p| p.template.id.as_str()).collect();
        assert_eq!(ids, vec!["bench", "lateral"]);
    }
}
