//! Split scheduling.
//!
//! Decision order:
//! 1. A persisted split newer than the last logged session was never
//!    trained, so it is scheduled again unchanged
//! 2. Splits not trained at all this week come first
//! 3. Otherwise the least-frequent split this week that is rested
//! 4. Otherwise the split with the longest rest
//!
//! Ties always go to the earlier split in `Split::ALL`.

use crate::history::HistoryAnalysis;
use crate::{Split, SplitAssignment};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Minimum whole days since a split was trained before the
/// least-frequent rule may pick it again
pub const MIN_REST_DAYS: i64 = 2;

/// Why a split was chosen
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleReason {
    /// Previously scheduled split was never logged
    RetryUnlogged,
    /// Split not trained this week
    Uncovered,
    /// Least trained split this week, and rested
    LeastFrequent,
    /// Every split is fatigued; longest rested wins
    LongestRest,
    /// Chosen by the caller
    Override,
}

/// A scheduling decision
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct ScheduleDecision {
    pub split: Split,
    pub reason: ScheduleReason,
}

/// Days since a split was last dominant; never-trained sorts as most rested
fn rest_days(analysis: &HistoryAnalysis, split: Split, now: DateTime<Utc>) -> i64 {
    analysis.days_since_hit(split, now).unwrap_or(i64::MAX)
}

/// Pick the most rested split from candidates, keeping the earliest on ties
fn most_rested(
    candidates: impl Iterator<Item = Split>,
    analysis: &HistoryAnalysis,
    now: DateTime<Utc>,
) -> Option<Split> {
    let mut best: Option<(Split, i64)> = None;
    for split in candidates {
        let rest = rest_days(analysis, split, now);
        if best.map_or(true, |(_, best_rest)| rest > best_rest) {
            best = Some((split, rest));
        }
    }
    best.map(|(split, _)| split)
}

/// Choose today's split
pub fn choose_split(
    analysis: &HistoryAnalysis,
    previous: Option<&SplitAssignment>,
    now: DateTime<Utc>,
) -> ScheduleDecision {
    // Rule 1: retry a split that was scheduled but never logged
    if let Some(previous) = previous {
        let unlogged = match analysis.last_session_at {
            Some(last) => previous.assigned_at > last,
            None => true,
        };
        if unlogged {
            tracing::info!(
                "Split {} scheduled at {} was never logged, retrying it",
                previous.split,
                previous.assigned_at
            );
            return ScheduleDecision {
                split: previous.split,
                reason: ScheduleReason::RetryUnlogged,
            };
        }
    }

    // Rule 2: coverage first
    let uncovered = Split::ALL
        .into_iter()
        .filter(|s| analysis.weekly_count(*s) == 0);
    if let Some(split) = most_rested(uncovered, analysis, now) {
        tracing::info!("Split {} not trained this week, scheduling it", split);
        return ScheduleDecision {
            split,
            reason: ScheduleReason::Uncovered,
        };
    }

    // Rule 3: least frequent this week, if rested
    let mut by_frequency = Split::ALL.to_vec();
    by_frequency.sort_by_key(|s| analysis.weekly_count(*s));
    if let Some(split) = by_frequency
        .into_iter()
        .find(|s| rest_days(analysis, *s, now) >= MIN_REST_DAYS)
    {
        tracing::info!(
            "All splits trained this week; {} is least frequent ({}x) and rested",
            split,
            analysis.weekly_count(split)
        );
        return ScheduleDecision {
            split,
            reason: ScheduleReason::LeastFrequent,
        };
    }

    // Rule 4: longest rest
    let split = most_rested(Split::ALL.into_iter(), analysis, now).unwrap_or(Split::ALL[0]);
    tracing::info!("Every split trained recently; {} has rested longest", split);
    ScheduleDecision {
        split,
        reason: ScheduleReason::LongestRest,
    }
}
