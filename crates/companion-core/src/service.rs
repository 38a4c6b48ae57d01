//! Check-in orchestration.
//!
//! [`CheckInService`] is the caller the streak engine expects: it records the
//! check-in, runs the encouragement decorator on the result, credits the
//! user's points and reports the refreshed streak figures.

use chrono::NaiveDate;
use serde::Serialize;

use crate::checkin::{CheckInRecord, GoalStreakState, MicroRecordDraft};
use crate::clock::Clock;
use crate::encouragement::Encourager;
use crate::error::CoreError;
use crate::ledger::RewardLedger;
use crate::storage::CheckInStore;
use crate::streak::StreakEngine;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckInOutcome {
    Recorded {
        record: CheckInRecord,
        state: GoalStreakState,
        /// Balance after crediting; `None` for anonymous check-ins.
        balance: Option<i64>,
    },
    /// Today was already done; nothing changed.
    AlreadyDone { state: GoalStreakState },
}

impl CheckInOutcome {
    pub fn state(&self) -> &GoalStreakState {
        match self {
            Self::Recorded { state, .. } | Self::AlreadyDone { state } => state,
        }
    }
}

pub struct CheckInService<S, L, C> {
    engine: StreakEngine<S, C>,
    ledger: L,
    encourager: Encourager,
}

impl<S: CheckInStore, L: RewardLedger, C: Clock> CheckInService<S, L, C> {
    pub fn new(engine: StreakEngine<S, C>, ledger: L, encourager: Encourager) -> Self {
        Self {
            engine,
            ledger,
            encourager,
        }
    }

    pub fn engine(&self) -> &StreakEngine<S, C> {
        &self.engine
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Check in `goal_id` for `today`.
    ///
    /// A repeat on the same day is reported as [`CheckInOutcome::AlreadyDone`]
    /// with the current streak instead of an error.
    pub fn check_in(
        &mut self,
        user_id: Option<&str>,
        goal_id: &str,
        today: NaiveDate,
        draft: Option<MicroRecordDraft>,
    ) -> Result<CheckInOutcome, CoreError> {
        let record = match self.engine.record_check_in(goal_id, user_id, today, draft) {
            Ok(record) => record,
            Err(e) if e.is_already_checked_in() => {
                let state = self.engine.streak_state(goal_id, today)?;
                return Ok(CheckInOutcome::AlreadyDone { state });
            }
            Err(e) => return Err(e.into()),
        };

        // Credit first: once the record exists, a retry only sees AlreadyDone.
        let balance = match user_id {
            Some(user) if record.stars_earned > 0 => Some(self.ledger.credit(
                user,
                i64::from(record.stars_earned),
                &format!("check-in:{goal_id}:{today}"),
            )?),
            Some(user) => Some(self.ledger.balance(user)?),
            None => None,
        };

        let record = self.encourager.persist(self.engine.store(), record);

        let state = self.engine.streak_state(goal_id, today)?;
        Ok(CheckInOutcome::Recorded {
            record,
            state,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::encouragement::tests::FailingUpdates;
    use crate::ledger::MemoryLedger;
    use crate::storage::{EncouragementConfig, MemoryStore};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service(probability: f64) -> CheckInService<MemoryStore, MemoryLedger, FixedClock> {
        let engine = StreakEngine::with_clock(MemoryStore::new(), FixedClock::new(day("2024-01-01")));
        let encourager = Encourager::from_config(&EncouragementConfig {
            probability,
            seed: Some(1),
            ..Default::default()
        });
        CheckInService::new(engine, MemoryLedger::new(), encourager)
    }

    #[test]
    fn recorded_check_in_credits_stars() {
        let mut svc = service(0.0);
        let outcome = svc
            .check_in(Some("amy"), "walk", day("2024-01-01"), None)
            .unwrap();

        match outcome {
            CheckInOutcome::Recorded { state, balance, .. } => {
                assert_eq!(balance, Some(1));
                assert_eq!(state.current_streak_length, 1);
                assert!(state.checked_in_today);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(svc.ledger().balance("amy").unwrap(), 1);
    }

    #[test]
    fn repeat_is_already_done_and_not_credited_twice() {
        let mut svc = service(0.0);
        svc.check_in(Some("amy"), "walk", day("2024-01-01"), None)
            .unwrap();
        let outcome = svc
            .check_in(Some("amy"), "walk", day("2024-01-01"), None)
            .unwrap();

        assert!(matches!(outcome, CheckInOutcome::AlreadyDone { .. }));
        assert_eq!(outcome.state().current_streak_length, 1);
        assert_eq!(svc.ledger().balance("amy").unwrap(), 1);
    }

    #[test]
    fn encouragement_is_persisted() {
        let mut svc = service(1.0);
        let outcome = svc
            .check_in(None, "walk", day("2024-01-01"), None)
            .unwrap();
        let CheckInOutcome::Recorded { record, balance, .. } = outcome else {
            panic!("expected a new record");
        };
        assert!(balance.is_none());
        assert!(record.anonymous_encouragement.is_some());

        let stored = svc
            .engine()
            .today_check_in("walk", day("2024-01-01"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.anonymous_encouragement, record.anonymous_encouragement);
    }

    #[test]
    fn failed_encouragement_write_still_credits_stars() {
        let engine = StreakEngine::with_clock(
            FailingUpdates(MemoryStore::new()),
            FixedClock::new(day("2024-01-01")),
        );
        let encourager = Encourager::from_config(&EncouragementConfig {
            probability: 1.0,
            seed: Some(1),
            ..Default::default()
        });
        let mut svc = CheckInService::new(engine, MemoryLedger::new(), encourager);

        let outcome = svc
            .check_in(Some("amy"), "walk", day("2024-01-01"), None)
            .unwrap();
        let CheckInOutcome::Recorded { record, balance, .. } = outcome else {
            panic!("expected a new record");
        };
        assert_eq!(balance, Some(1));
        assert!(record.anonymous_encouragement.is_none());

        let again = svc
            .check_in(Some("amy"), "walk", day("2024-01-01"), None)
            .unwrap();
        assert!(matches!(again, CheckInOutcome::AlreadyDone { .. }));
        assert_eq!(svc.ledger().balance("amy").unwrap(), 1);
        assert_eq!(svc.engine().store().0.len(), 1);
    }
}
