mod config;
pub mod database;
pub mod memory;
pub mod migrations;

pub use config::{CheckInConfig, Config, EncouragementConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::checkin::{CheckInPatch, CheckInRecord};
use crate::error::StorageError;

/// Persistence port for check-in records.
///
/// `insert` is the authoritative uniqueness check: implementations must
/// reject a second record for the same `(goal_id, date)` with
/// [`StorageError::Duplicate`] even when two callers race.
pub trait CheckInStore {
    fn find_by_goal_and_date(
        &self,
        goal_id: &str,
        date: NaiveDate,
    ) -> Result<Option<CheckInRecord>, StorageError>;

    /// All records of a goal in insertion order.
    fn find_all_by_goal(&self, goal_id: &str) -> Result<Vec<CheckInRecord>, StorageError>;

    fn insert(&self, record: &CheckInRecord) -> Result<(), StorageError>;

    fn update(&self, id: Uuid, patch: &CheckInPatch) -> Result<CheckInRecord, StorageError>;
}

impl<T: CheckInStore + ?Sized> CheckInStore for &T {
    fn find_by_goal_and_date(
        &self,
        goal_id: &str,
        date: NaiveDate,
    ) -> Result<Option<CheckInRecord>, StorageError> {
        (**self).find_by_goal_and_date(goal_id, date)
    }

    fn find_all_by_goal(&self, goal_id: &str) -> Result<Vec<CheckInRecord>, StorageError> {
        (**self).find_all_by_goal(goal_id)
    }

    fn insert(&self, record: &CheckInRecord) -> Result<(), StorageError> {
        (**self).insert(record)
    }

    fn update(&self, id: Uuid, patch: &CheckInPatch) -> Result<CheckInRecord, StorageError> {
        (**self).update(id, patch)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `COMPANION_HOME` overrides the location outright. Otherwise this is
/// `~/.config/companion/`, or `~/.config/companion-dev/` when
/// `COMPANION_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("COMPANION_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("COMPANION_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("companion-dev")
            } else {
                base_dir.join("companion")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
