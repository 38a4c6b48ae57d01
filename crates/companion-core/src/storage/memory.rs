//! In-process check-in store.
//!
//! Used for offline mode and tests. The mutex is held across the duplicate
//! check and the push, so concurrent inserts for one day have a single winner.

use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use super::CheckInStore;
use crate::checkin::{CheckInPatch, CheckInRecord};
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CheckInRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records, keeping their order as insertion order.
    ///
    /// Records that would break the one-per-day rule are rejected.
    pub fn with_records(
        records: impl IntoIterator<Item = CheckInRecord>,
    ) -> Result<Self, StorageError> {
        let store = Self::new();
        for record in records {
            store.insert(&record)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckInStore for MemoryStore {
    fn find_by_goal_and_date(
        &self,
        goal_id: &str,
        date: NaiveDate,
    ) -> Result<Option<CheckInRecord>, StorageError> {
        let records = self.records.lock()?;
        Ok(records
            .iter()
            .find(|r| r.goal_id == goal_id && r.date == date)
            .cloned())
    }

    fn find_all_by_goal(&self, goal_id: &str) -> Result<Vec<CheckInRecord>, StorageError> {
        let records = self.records.lock()?;
        Ok(records
            .iter()
            .filter(|r| r.goal_id == goal_id)
            .cloned()
            .collect())
    }

    fn insert(&self, record: &CheckInRecord) -> Result<(), StorageError> {
        let mut records = self.records.lock()?;
        if records
            .iter()
            .any(|r| r.goal_id == record.goal_id && r.date == record.date)
        {
            return Err(StorageError::Duplicate {
                goal_id: record.goal_id.clone(),
                date: record.date,
            });
        }
        records.push(record.clone());
        Ok(())
    }

    fn update(&self, id: Uuid, patch: &CheckInPatch) -> Result<CheckInRecord, StorageError> {
        let mut records = self.records.lock()?;
        let target = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StorageError::RecordNotFound(id))?;
        patch.apply(target);
        Ok(target.clone())
    }
}
