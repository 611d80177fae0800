//! The autoplan pipeline.
//!
//! One run: fetch history and templates, analyze, schedule a split, select
//! exercises, build the routine, sync it, check what the store kept, and
//! finally refresh the routine cache whatever happened.

use crate::cache::RoutineCache;
use crate::catalog::TemplateCatalog;
use crate::history::{analyze, HistoryAnalysis};
use crate::progression::ProgressionRecord;
use crate::remote::{RoutineStore, WorkoutSource};
use crate::routine::build_routine;
use crate::scheduler::{choose_split, ScheduleDecision, ScheduleReason};
use crate::selector::ExerciseSelector;
use crate::sync::{RoutineSynchronizer, SyncAction, SyncOutcome};
use crate::{
    Config, ExercisePick, PlannedSet, RemoteRoutine, Result, RoutinePayload, Split,
    SplitAssignment, WeightSource,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::Instrument;
use uuid::Uuid;

/// How `Autoplanner::plan` should behave
#[derive(Clone, Debug, Default)]
pub struct PlanOptions {
    /// Train this split instead of asking the scheduler
    pub split_override: Option<Split>,
    /// Write the chosen split to the assignment file
    pub persist_assignment: bool,
    /// Start selection with every filter dropped
    pub relaxed: bool,
}

/// Selected picks and the routine built from them
#[derive(Clone, Debug)]
pub struct Composition {
    pub strength: Vec<ExercisePick>,
    pub abs: Vec<ExercisePick>,
    pub payload: RoutinePayload,
}

/// Everything decided for today, before anything is synced
#[derive(Clone, Debug)]
pub struct Plan {
    pub catalog: TemplateCatalog,
    pub analysis: HistoryAnalysis,
    pub previous: Option<SplitAssignment>,
    pub decision: ScheduleDecision,
    pub composition: Composition,
}

/// One exercise line of today's workout
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLine {
    pub title: String,
    pub exercise_template_id: String,
    pub superset_id: Option<u32>,
    pub rest_seconds: u32,
    pub note: String,
    pub sets: Vec<PlannedSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_source: Option<WeightSource>,
}

/// Summary of today's workout for reports
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaysWorkout {
    pub split: Split,
    pub reason: ScheduleReason,
    pub title: String,
    pub exercises: Vec<WorkoutLine>,
}

impl TodaysWorkout {
    pub fn new(decision: ScheduleDecision, composition: &Composition) -> Self {
        let picks: Vec<&ExercisePick> = composition
            .strength
            .iter()
            .chain(&composition.abs)
            .collect();

        let exercises = composition
            .payload
            .exercises
            .iter()
            .map(|entry| WorkoutLine {
                title: entry.title.clone(),
                exercise_template_id: entry.exercise_template_id.clone(),
                superset_id: entry.superset_id,
                rest_seconds: entry.rest_seconds,
                note: entry.notes.clone(),
                sets: entry.sets.clone(),
                weight_source: picks
                    .iter()
                    .find(|p| p.template.id == entry.exercise_template_id)
                    .map(|p| p.weight_source.clone()),
            })
            .collect();

        Self {
            split: decision.split,
            reason: decision.reason,
            title: composition.payload.title.clone(),
            exercises,
        }
    }
}

/// Result handed to report renderers
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine: Option<RemoteRoutine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todays_workout: Option<TodaysWorkout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    fn succeeded(run_id: Uuid, outcome: SyncOutcome, workout: TodaysWorkout) -> Self {
        let verb = match outcome.action {
            SyncAction::Created => "Created",
            SyncAction::Updated => "Updated",
        };
        Self {
            success: true,
            run_id: run_id.to_string(),
            message: Some(format!(
                "{} routine '{}' with {} exercises",
                verb,
                outcome.routine.title,
                workout.exercises.len()
            )),
            routine: Some(outcome.routine),
            todays_workout: Some(workout),
            error: None,
        }
    }

    fn failed(run_id: Uuid, error: String) -> Self {
        Self {
            success: false,
            run_id: run_id.to_string(),
            message: None,
            routine: None,
            todays_workout: None,
            error: Some(error),
        }
    }
}

/// Scheduling and progression state, without selecting anything
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub sessions_analyzed: usize,
    pub last_session_at: Option<DateTime<Utc>>,
    pub weekly_split_frequency: BTreeMap<Split, u32>,
    pub days_since_hit: BTreeMap<Split, Option<i64>>,
    pub previous_assignment: Option<SplitAssignment>,
    pub next: ScheduleDecision,
    pub progression: Vec<ProgressionRecord>,
}

pub struct Autoplanner<'a> {
    source: &'a dyn WorkoutSource,
    config: &'a Config,
    split_override: Option<Split>,
}

impl<'a> Autoplanner<'a> {
    pub fn new(source: &'a dyn WorkoutSource, config: &'a Config) -> Self {
        Self {
            source,
            config,
            split_override: None,
        }
    }

    /// Force the split for `run`
    pub fn with_split(mut self, split: Option<Split>) -> Self {
        self.split_override = split;
        self
    }

    async fn load(&self, now: DateTime<Utc>) -> Result<(TemplateCatalog, HistoryAnalysis)> {
        let templates = self.source.exercise_templates().await?;
        let catalog = TemplateCatalog::new(templates);
        if catalog.is_empty() {
            tracing::warn!("Exercise template catalog is empty");
        }
        for problem in catalog.validate() {
            tracing::warn!("Template catalog: {}", problem);
        }

        let sessions = self
            .source
            .recent_workouts(self.config.analysis.window_sessions)
            .await?;
        let analysis = analyze(&sessions, &catalog, now, self.config);
        Ok((catalog, analysis))
    }

    /// Select and build a routine for `split`
    pub fn compose(
        &self,
        catalog: &TemplateCatalog,
        analysis: &HistoryAnalysis,
        split: Split,
        now: DateTime<Utc>,
        relaxed: bool,
    ) -> Result<Composition> {
        let selector = ExerciseSelector::new(catalog, analysis, self.config, now);
        let strength = selector.select(split, self.config.selection.count_for(split), relaxed);

        let exclude: HashSet<String> = strength.iter().map(|p| p.template.id.clone()).collect();
        let abs = selector.select_abs_finishers(
            self.config.selection.abs_count_for(split),
            &exclude,
            relaxed,
        );

        let payload = build_routine(&strength, &abs, split, &self.config.routine, now)?;
        Ok(Composition {
            strength,
            abs,
            payload,
        })
    }

    /// Decide today's split and routine without touching the routine store
    pub async fn plan(&self, now: DateTime<Utc>, options: &PlanOptions) -> Result<Plan> {
        let (catalog, analysis) = self.load(now).await?;
        let assignment_path = self.config.data.assignment_path();
        let previous = SplitAssignment::load(&assignment_path);

        let decision = match options.split_override {
            Some(split) => ScheduleDecision {
                split,
                reason: ScheduleReason::Override,
            },
            None => choose_split(&analysis, previous.as_ref(), now),
        };
        tracing::info!("Today's split: {} ({:?})", decision.split, decision.reason);

        if options.persist_assignment {
            SplitAssignment {
                split: decision.split,
                assigned_at: now,
            }
            .save(&assignment_path)?;
        }

        let composition = self.compose(&catalog, &analysis, decision.split, now, options.relaxed)?;
        Ok(Plan {
            catalog,
            analysis,
            previous,
            decision,
            composition,
        })
    }

    /// Analysis and next split, for display
    pub async fn status(&self, now: DateTime<Utc>) -> Result<StatusReport> {
        let (_, analysis) = self.load(now).await?;
        let previous = SplitAssignment::load(&self.config.data.assignment_path());
        let next = choose_split(&analysis, previous.as_ref(), now);

        let mut progression: Vec<ProgressionRecord> =
            analysis.progression.values().cloned().collect();
        progression.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(StatusReport {
            sessions_analyzed: analysis.sessions_analyzed,
            last_session_at: analysis.last_session_at,
            weekly_split_frequency: analysis.weekly_split_frequency.clone(),
            days_since_hit: Split::ALL
                .iter()
                .map(|s| (*s, analysis.days_since_hit(*s, now)))
                .collect(),
            previous_assignment: previous,
            next,
            progression,
        })
    }

    /// Run the whole pipeline against `store`
    ///
    /// Never fails: errors are reported in the returned `RunReport`.
    pub async fn run(&self, store: &dyn RoutineStore, now: DateTime<Utc>) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("autoplan_run", run_id = %run_id);

        async move {
            let cache = RoutineCache::new(self.config.data.routine_cache_path());
            let sync = RoutineSynchronizer::new(store, &cache, self.config);

            let result = self.execute(&sync, now).await;
            sync.refresh().await;

            match result {
                Ok((outcome, workout)) => {
                    let report = RunReport::succeeded(run_id, outcome, workout);
                    if let Some(message) = &report.message {
                        tracing::info!("{}", message);
                    }
                    report
                }
                Err(e) => {
                    tracing::error!("Run failed: {}", e);
                    RunReport::failed(run_id, e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        sync: &RoutineSynchronizer<'_>,
        now: DateTime<Utc>,
    ) -> Result<(SyncOutcome, TodaysWorkout)> {
        let options = PlanOptions {
            split_override: self.split_override,
            persist_assignment: true,
            relaxed: false,
        };
        let mut plan = self.plan(now, &options).await?;
        let mut outcome = sync.sync(&plan.composition.payload).await?;

        let intended = plan.composition.payload.exercises.len();
        let kept = outcome.routine.exercises.len();
        if plan.decision.split != Split::Cardio && kept < intended {
            tracing::warn!(
                "Store kept {} of {} exercises, rebuilding with filters relaxed",
                kept,
                intended
            );
            let relaxed = self.compose(
                &plan.catalog,
                &plan.analysis,
                plan.decision.split,
                now,
                true,
            )?;
            outcome.routine = sync.update(&outcome.routine.id, &relaxed.payload).await?;
            plan.composition = relaxed;
        }

        let workout = TodaysWorkout::new(plan.decision, &plan.composition);
        Ok((outcome, workout))
    }
}
