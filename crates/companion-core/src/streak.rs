//! Check-in streak and cumulative-progress engine.
//!
//! The engine records at most one check-in per goal per day and derives streak
//! figures from the stored history. Every operation takes `today` from the
//! caller, so the results are deterministic for a given record set.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::{
    CheckInPatch, CheckInRecord, CheckInStatus, GoalStreakState, MicroRecordDraft,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{CheckInError, StorageError, ValidationError};
use crate::storage::{CheckInConfig, CheckInStore};

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stars written to `stars_earned` on each new check-in.
    pub stars_per_check_in: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stars_per_check_in: 1,
        }
    }
}

impl From<&CheckInConfig> for EngineConfig {
    fn from(config: &CheckInConfig) -> Self {
        Self {
            stars_per_check_in: config.stars_per_check_in,
        }
    }
}

/// Records check-ins and derives streak figures for any [`CheckInStore`].
///
/// The clock only stamps new records; day arithmetic always uses the `today`
/// the caller passes in. Balances are never touched here.
pub struct StreakEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
}

impl<S: CheckInStore> StreakEngine<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: CheckInStore, C: Clock> StreakEngine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record today's check-in for a goal.
    ///
    /// Refuses with [`CheckInError::AlreadyCheckedIn`] if the goal already has
    /// a record for `today`; nothing is written in that case. The store's
    /// insert is the authoritative check, so of two racing calls only one
    /// succeeds. Crediting `stars_earned` to the user is left to the caller.
    pub fn record_check_in(
        &self,
        goal_id: &str,
        user_id: Option<&str>,
        today: NaiveDate,
        draft: Option<MicroRecordDraft>,
    ) -> Result<CheckInRecord, CheckInError> {
        if goal_id.is_empty() {
            return Err(ValidationError::EmptyField("goal_id").into());
        }

        if self.store.find_by_goal_and_date(goal_id, today)?.is_some() {
            tracing::debug!(goal_id, %today, "check-in refused, already done today");
            return Err(already_checked_in(goal_id, today));
        }

        let now = self.clock.now();
        let record = CheckInRecord {
            id: Uuid::new_v4(),
            user_id: user_id.map(str::to_string),
            goal_id: goal_id.to_string(),
            date: today,
            status: CheckInStatus::Completed,
            record: draft.map(|d| d.into_record(now)),
            stars_earned: self.config.stars_per_check_in,
            likes: BTreeSet::new(),
            anonymous_encouragement: None,
            timestamp: now,
        };

        match self.store.insert(&record) {
            Ok(()) => {}
            Err(StorageError::Duplicate { .. }) => {
                tracing::debug!(goal_id, %today, "check-in lost insert race");
                return Err(already_checked_in(goal_id, today));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(goal_id, %today, id = %record.id, "checked in");
        Ok(record)
    }

    /// Today's record for the goal, if any.
    pub fn today_check_in(
        &self,
        goal_id: &str,
        today: NaiveDate,
    ) -> Result<Option<CheckInRecord>, CheckInError> {
        Ok(self.store.find_by_goal_and_date(goal_id, today)?)
    }

    /// Attach (or replace) the micro-record on today's check-in.
    ///
    /// The previous micro-record, if any, is discarded. Text length is not
    /// checked here; see [`MicroRecordDraft::validate`].
    pub fn attach_record_to_today(
        &self,
        goal_id: &str,
        today: NaiveDate,
        text: &str,
        image: Option<&str>,
    ) -> Result<CheckInRecord, CheckInError> {
        let existing = self
            .store
            .find_by_goal_and_date(goal_id, today)?
            .ok_or_else(|| CheckInError::NotFound {
                goal_id: goal_id.to_string(),
                date: today,
            })?;

        let draft = MicroRecordDraft {
            text: text.to_string(),
            image: image.map(str::to_string),
        };
        let patch = CheckInPatch {
            record: Some(draft.into_record(self.clock.now())),
            ..Default::default()
        };
        let updated = self.store.update(existing.id, &patch)?;

        tracing::info!(goal_id, %today, "micro-record attached");
        Ok(updated)
    }

    /// Number of consecutive days checked in, counting back from today.
    ///
    /// If today has no check-in yet, counting starts from yesterday (grace
    /// period). A latest check-in older than yesterday means the streak is
    /// broken. The walk follows creation order and stops at the first record
    /// that is not exactly the expected day.
    pub fn compute_streak(&self, goal_id: &str, today: NaiveDate) -> Result<u32, CheckInError> {
        let records = self.store.find_all_by_goal(goal_id)?;
        Ok(streak_from_records(records, today))
    }

    /// Total number of records for the goal, whatever their status or spacing.
    pub fn compute_cumulative(&self, goal_id: &str) -> Result<u32, CheckInError> {
        let records = self.store.find_all_by_goal(goal_id)?;
        Ok(records.len() as u32)
    }

    /// Streak, cumulative count and today's status from a single history read.
    pub fn streak_state(
        &self,
        goal_id: &str,
        today: NaiveDate,
    ) -> Result<GoalStreakState, CheckInError> {
        let records = self.store.find_all_by_goal(goal_id)?;
        let cumulative_count = records.len() as u32;
        let checked_in_today = records.iter().any(|r| r.date == today);
        let current_streak_length = streak_from_records(records, today);

        Ok(GoalStreakState {
            is_alive_today: current_streak_length > 0,
            current_streak_length,
            cumulative_count,
            checked_in_today,
        })
    }

    /// All records for the goal, most recent first.
    pub fn history(&self, goal_id: &str) -> Result<Vec<CheckInRecord>, CheckInError> {
        let mut records = self.store.find_all_by_goal(goal_id)?;
        sort_most_recent_first(&mut records);
        Ok(records)
    }
}

fn already_checked_in(goal_id: &str, date: NaiveDate) -> CheckInError {
    CheckInError::AlreadyCheckedIn {
        goal_id: goal_id.to_string(),
        date,
    }
}

/// Descending by timestamp; equal timestamps put the later insertion first.
///
/// Expects `records` in insertion order.
fn sort_most_recent_first(records: &mut [CheckInRecord]) {
    records.reverse();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn streak_from_records(records: Vec<CheckInRecord>, today: NaiveDate) -> u32 {
    let mut completed: Vec<_> = records.into_iter().filter(|r| r.is_completed()).collect();
    sort_most_recent_first(&mut completed);

    let Some(latest) = completed.first() else {
        return 0;
    };
    let Some(yesterday) = today.pred_opt() else {
        return 0;
    };

    let mut cursor = if latest.date == today {
        today
    } else if latest.date == yesterday {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    for record in &completed {
        if record.date != cursor {
            break;
        }
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}
