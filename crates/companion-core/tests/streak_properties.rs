//! Property tests for the streak engine.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use companion_core::{CheckInStore, FixedClock, MemoryStore, StreakEngine};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn offset(days: u64) -> NaiveDate {
    base().checked_add_days(Days::new(days)).unwrap()
}

proptest! {
    /// Any sequence of check-in attempts leaves one record per goal and day.
    #[test]
    fn at_most_one_record_per_goal_and_day(
        attempts in prop::collection::vec((0usize..3, 0u64..10), 1..60)
    ) {
        let goals = ["run", "read", "sleep"];
        let engine = StreakEngine::with_clock(MemoryStore::new(), FixedClock::new(base()));

        let mut expected = BTreeSet::new();
        for (goal, d) in &attempts {
            let result = engine.record_check_in(goals[*goal], None, offset(*d), None);
            let fresh = expected.insert((*goal, *d));
            prop_assert_eq!(result.is_ok(), fresh);
        }

        for (g, goal) in goals.iter().enumerate() {
            let records = engine.store().find_all_by_goal(goal).unwrap();
            let days: BTreeSet<_> = records.iter().map(|r| r.date).collect();
            prop_assert_eq!(days.len(), records.len());
            let want = expected.iter().filter(|(eg, _)| *eg == g).count();
            prop_assert_eq!(records.len(), want);
        }
    }

    /// Checking in on days in chronological order: the streak equals the length
    /// of the unbroken run ending at the last day, or zero once it is stale.
    #[test]
    fn streak_matches_trailing_run(
        days in prop::collection::btree_set(0u64..30, 1..20),
        later in 0u64..4,
    ) {
        let engine = StreakEngine::with_clock(MemoryStore::new(), FixedClock::new(base()));
        for d in &days {
            engine.clock().set_today(offset(*d));
            engine.record_check_in("g", None, offset(*d), None).unwrap();
        }

        let last = *days.iter().next_back().unwrap();
        let mut run = 0u32;
        let mut cursor = last;
        while days.contains(&cursor) {
            run += 1;
            if cursor == 0 {
                break;
            }
            cursor -= 1;
        }

        let today = offset(last + later);
        let expected = if later <= 1 { run } else { 0 };
        prop_assert_eq!(engine.compute_streak("g", today).unwrap(), expected);
        prop_assert_eq!(engine.compute_cumulative("g").unwrap() as usize, days.len());
    }
}
