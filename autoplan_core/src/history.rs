//! Workout history analysis.
//!
//! Turns the most recent sessions into the frequency, recency and
//! progression tables the scheduler and selector work from. Everything here
//! is recomputed from scratch on every run.

use crate::catalog::{split_for_muscle, TemplateCatalog};
use crate::progression::{build_progression, title_key, ProgressionRecord};
use crate::{Config, Split, WorkoutSession};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Statistics derived from recent workout history
#[derive(Clone, Debug, Default)]
pub struct HistoryAnalysis {
    /// Sessions that fell inside the analysis window
    pub sessions_analyzed: usize,
    /// Quantifiable sets per primary muscle group
    pub muscle_frequency: BTreeMap<String, u32>,
    /// Sessions in which each exercise title was performed
    pub exercise_frequency: BTreeMap<String, u32>,
    /// Progression records keyed by lowercase title
    pub progression: HashMap<String, ProgressionRecord>,
    /// Sessions this week per dominant split (every split present)
    pub weekly_split_frequency: BTreeMap<Split, u32>,
    /// Most recent session where each split was dominant
    pub split_last_hit: HashMap<Split, DateTime<Utc>>,
    /// Lowercase titles performed within the recent-title window
    pub recent_titles: HashSet<String>,
    /// Most recent performance per template id
    pub last_performed: HashMap<String, DateTime<Utc>>,
    /// Sessions within the variety window per template id
    pub variety_usage: HashMap<String, u32>,
    /// Start of the most recent session
    pub last_session_at: Option<DateTime<Utc>>,
    /// Performed exercises whose template could not be resolved
    pub unresolved_exercises: usize,
}

impl HistoryAnalysis {
    /// Whole calendar days since a split was last dominant
    pub fn days_since_hit(&self, split: Split, now: DateTime<Utc>) -> Option<i64> {
        self.split_last_hit
            .get(&split)
            .map(|hit| (now.date_naive() - hit.date_naive()).num_days())
    }

    pub fn weekly_count(&self, split: Split) -> u32 {
        self.weekly_split_frequency.get(&split).copied().unwrap_or(0)
    }

    /// Whether a template was performed at or after `since`
    pub fn performed_since(&self, template_id: &str, since: DateTime<Utc>) -> bool {
        self.last_performed
            .get(template_id)
            .is_some_and(|at| *at >= since)
    }

    pub fn is_recent_title(&self, title: &str) -> bool {
        self.recent_titles.contains(&title_key(title))
    }

    pub fn usage(&self, template_id: &str) -> u32 {
        self.variety_usage.get(template_id).copied().unwrap_or(0)
    }

    pub fn muscle_count(&self, muscle: &str) -> u32 {
        self.muscle_frequency.get(muscle).copied().unwrap_or(0)
    }

    pub fn progression_for(&self, title: &str) -> Option<&ProgressionRecord> {
        self.progression.get(&title_key(title))
    }
}

/// Dominant split of a session: the split most of its exercises belong to,
/// ties going to the split encountered first.
pub fn dominant_split(session: &WorkoutSession, catalog: &TemplateCatalog) -> Option<Split> {
    let mut counts: Vec<(Split, u32)> = Vec::new();

    for exercise in &session.exercises {
        let Some(split) = catalog
            .resolve(exercise)
            .and_then(|t| split_for_muscle(&t.primary_muscle_group))
        else {
            continue;
        };
        match counts.iter_mut().find(|(s, _)| *s == split) {
            Some((_, count)) => *count += 1,
            None => counts.push((split, 1)),
        }
    }

    let mut best: Option<(Split, u32)> = None;
    for (split, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((split, count));
        }
    }
    best.map(|(split, _)| split)
}

/// Analyze recent sessions
///
/// Only the most recent `analysis.window_sessions` sessions are considered.
/// Exercises without a resolvable template are skipped for frequency tables
/// but still count towards progression and recent titles.
pub fn analyze(
    sessions: &[WorkoutSession],
    catalog: &TemplateCatalog,
    now: DateTime<Utc>,
    config: &Config,
) -> HistoryAnalysis {
    let mut ordered: Vec<&WorkoutSession> = sessions.iter().collect();
    ordered.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    ordered.truncate(config.analysis.window_sessions);

    let week_start = now - Duration::days(config.analysis.week_days);
    let recent_start = now - Duration::hours(config.analysis.recent_title_hours);
    let variety_start = now - Duration::days(config.selection.variety_window_days);

    let mut analysis = HistoryAnalysis {
        sessions_analyzed: ordered.len(),
        last_session_at: ordered.first().map(|s| s.start_time),
        weekly_split_frequency: Split::ALL.iter().map(|s| (*s, 0)).collect(),
        ..Default::default()
    };

    for session in &ordered {
        let mut seen_in_session: HashSet<&str> = HashSet::new();

        for exercise in &session.exercises {
            if session.start_time > recent_start {
                analysis.recent_titles.insert(title_key(&exercise.title));
            }

            let Some(template) = catalog.resolve(exercise) else {
                analysis.unresolved_exercises += 1;
                tracing::warn!(
                    "No template found for '{}' in session {}, skipping",
                    exercise.title,
                    session.id
                );
                continue;
            };

            let quantifiable = exercise.sets.iter().filter(|s| s.is_quantifiable()).count() as u32;
            if quantifiable > 0 {
                *analysis
                    .muscle_frequency
                    .entry(template.primary_muscle_group.clone())
                    .or_insert(0) += quantifiable;
            }
            *analysis
                .exercise_frequency
                .entry(exercise.title.clone())
                .or_insert(0) += 1;

            analysis
                .last_performed
                .entry(template.id.clone())
                .and_modify(|at| *at = (*at).max(session.start_time))
                .or_insert(session.start_time);

            if session.start_time > variety_start && seen_in_session.insert(template.id.as_str()) {
                *analysis.variety_usage.entry(template.id.clone()).or_insert(0) += 1;
            }
        }

        if let Some(split) = dominant_split(session, catalog) {
            analysis
                .split_last_hit
                .entry(split)
                .and_modify(|at| *at = (*at).max(session.start_time))
                .or_insert(session.start_time);
            if session.start_time > week_start {
                *analysis.weekly_split_frequency.entry(split).or_insert(0) += 1;
            }
        }
    }

    analysis.progression = build_progression(&ordered, &config.progression);

    tracing::info!(
        "Analyzed {} sessions: {} progression records, weekly splits {:?}",
        analysis.sessions_analyzed,
        analysis.progression.len(),
        analysis.weekly_split_frequency
    );

    analysis
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::catalog::template;
    use crate::{Equipment, SetRecord};

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::new(vec![
            template("bench", "Bench Press (Barbell)", "chest", Equipment::Barbell),
            template("ohp", "Overhead Press (Barbell)", "shoulders", Equipment::Barbell),
            template("row", "Bent Over Row (Barbell)", "upper_back", Equipment::Barbell),
            template("curl", "Bicep Curl (Dumbbell)", "biceps", Equipment::Dumbbell),
            template("squat", "Squat (Barbell)", "quadriceps", Equipment::Barbell),
        ])
    }

    #[test]
    fn test_dominant_split_majority() {
        let catalog = catalog();
        let s = session(
            "s1",
            Utc::now(),
            vec![
                performance("Squat (Barbell)", "squat", vec![loaded(100.0, 5)]),
                performance("Bent Over Row (Barbell)", "row", vec![loaded(60.0, 8)]),
                performance("Bicep Curl (Dumbbell)", "curl", vec![loaded(12.0, 10)]),
            ],
        );
        assert_eq!(dominant_split(&s, &catalog), Some(Split::Pull));
    }

    #[test]
    fn test_dominant_split_tie_goes_to_first_encountered() {
        let catalog = catalog();
        let s = session(
            "s1",
            Utc::now(),
            vec![
                performance("Squat (Barbell)", "squat", vec![]),
                performance("Bench Press (Barbell)", "bench", vec![]),
            ],
        );
        assert_eq!(dominant_split(&s, &catalog), Some(Split::Legs));
    }

    #[test]
    fn test_frequency_counts_only_quantifiable_sets() {
        let catalog = catalog();
        let now = Utc::now();
        let s = session(
            "s1",
            now - Duration::hours(2),
            vec![performance(
                "Bench Press (Barbell)",
                "bench",
                vec![
                    loaded(60.0, 8),
                    loaded(60.0, 8),
                    SetRecord {
                        reps: Some(10),
                        ..Default::default()
                    },
                ],
            )],
        );

        let analysis = analyze(&[s], &catalog, now, &Config::default());
        assert_eq!(analysis.muscle_count("chest"), 2);
        assert_eq!(analysis.exercise_frequency["Bench Press (Barbell)"], 1);
        assert_eq!(analysis.weekly_count(Split::Push), 1);
        assert!(analysis.is_recent_title("bench press (barbell)"));
    }

    #[test]
    fn test_missing_template_is_skipped_not_fatal() {
        let catalog = catalog();
        let now = Utc::now();
        let s = session(
            "s1",
            now - Duration::days(1),
            vec![
                performance("Mystery Machine", "nope", vec![loaded(10.0, 10)]),
                performance("Bench Press (Barbell)", "bench", vec![loaded(60.0, 8)]),
            ],
        );

        let analysis = analyze(&[s], &catalog, now, &Config::default());
        assert_eq!(analysis.unresolved_exercises, 1);
        assert_eq!(analysis.muscle_frequency.len(), 1);
        assert!(!analysis.exercise_frequency.contains_key("Mystery Machine"));
    }

    #[test]
    fn test_window_and_weekly_boundaries() {
        let catalog = catalog();
        let now = Utc::now();
        let mut sessions = Vec::new();
        for day in 0..40 {
            sessions.push(session(
                &format!("s{}", day),
                now - Duration::days(day),
                vec![performance("Bench Press (Barbell)", "bench", vec![loaded(60.0, 8)])],
            ));
        }

        let analysis = analyze(&sessions, &catalog, now, &Config::default());
        assert_eq!(analysis.sessions_analyzed, 30);
        // days 0..=6 are inside the 7-day week
        assert_eq!(analysis.weekly_count(Split::Push), 7);
        assert_eq!(analysis.weekly_count(Split::Legs), 0);
        assert_eq!(analysis.days_since_hit(Split::Push, now), Some(0));
        assert_eq!(analysis.usage("bench"), 21);
        assert_eq!(analysis.last_session_at, Some(now));
    }

    #[test]
    fn test_recent_titles_limited_to_one_day() {
        let catalog = catalog();
        let now = Utc::now();
        let sessions = vec![
            session(
                "today",
                now - Duration::hours(3),
                vec![performance("Squat (Barbell)", "squat", vec![loaded(100.0, 5)])],
            ),
            session(
                "earlier",
                now - Duration::days(2),
                vec![performance("Bench Press (Barbell)", "bench", vec![loaded(60.0, 8)])],
            ),
        ];

        let analysis = analyze(&sessions, &catalog, now, &Config::default());
        assert!(analysis.is_recent_title("Squat (Barbell)"));
        assert!(!analysis.is_recent_title("Bench Press (Barbell)"));
        assert!(analysis.performed_since("bench", now - Duration::days(7)));
        assert!(!analysis.performed_since("bench", now - Duration::days(1)));
    }
}
