//! Racing check-ins for the same goal and day must produce exactly one record.

use std::sync::Barrier;
use std::thread;

use chrono::NaiveDate;
use companion_core::{CheckInError, CheckInStore, Database, FixedClock, MemoryStore, StreakEngine};

const RACERS: usize = 8;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn tally(results: Vec<Result<(), CheckInError>>) -> (usize, usize) {
    let mut won = 0;
    let mut refused = 0;
    for result in results {
        match result {
            Ok(()) => won += 1,
            Err(e) if e.is_already_checked_in() => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    (won, refused)
}

#[test]
fn test_memory_store_single_winner() {
    let engine = StreakEngine::with_clock(MemoryStore::new(), FixedClock::new(today()));
    let barrier = Barrier::new(RACERS);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let engine = &engine;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    let user = format!("device-{i}");
                    engine
                        .record_check_in("stretch", Some(user.as_str()), today(), None)
                        .map(|_| ())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(tally(results), (1, RACERS - 1));
    assert_eq!(engine.store().find_all_by_goal("stretch").unwrap().len(), 1);
}

#[test]
fn test_sqlite_single_winner_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    // Create the schema before the race so the racers only contend on inserts.
    drop(Database::open_at(&path).unwrap());

    let barrier = Barrier::new(RACERS);
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                let path = &path;
                let barrier = &barrier;
                s.spawn(move || {
                    let db = Database::open_at(path).unwrap();
                    let engine = StreakEngine::with_clock(&db, FixedClock::new(today()));
                    barrier.wait();
                    engine
                        .record_check_in("stretch", None, today(), None)
                        .map(|_| ())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(tally(results), (1, RACERS - 1));
    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.find_all_by_goal("stretch").unwrap().len(), 1);
}
