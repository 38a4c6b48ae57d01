//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - Check-in records (one per goal per day, enforced by a unique index)
//! - The reward point ledger
//! - Key-value store for application state (groups live here as JSON)

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{data_dir, migrations, CheckInStore};
use crate::checkin::{CheckInPatch, CheckInRecord, CheckInStatus, MicroRecord};
use crate::error::{GroupError, LedgerError, StorageError};
use crate::group::Group;
use crate::ledger::RewardLedger;

const DATE_FORMAT: &str = "%Y-%m-%d";
const GROUP_PREFIX: &str = "group:";

const SELECT_CHECK_IN: &str = "SELECT id, user_id, goal_id, date, status, record, stars_earned,
                                      likes, anonymous_encouragement, timestamp
                               FROM check_ins";

/// SQLite database for check-ins, points and app state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/companion.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(StorageError::DataDirUnavailable)?;
        Self::open_at(dir.join("companion.db"))
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// Separate connections to the same file may be used from different
    /// threads; writers wait on each other through SQLite's busy timeout.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Open an in-memory database (for tests and throwaway sessions).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        migrations::migrate(&self.conn).map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// All kv entries whose key starts with `prefix`, ordered by key.
    pub fn kv_scan(&self, prefix: &str) -> Result<Vec<(String, String)>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map(params![prefix], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn save_group(&self, group: &Group) -> Result<(), GroupError> {
        let json = serde_json::to_string(group)?;
        self.kv_set(&format!("{GROUP_PREFIX}{}", group.id), &json)?;
        Ok(())
    }

    pub fn list_groups(&self) -> Result<Vec<Group>, GroupError> {
        let mut groups = Vec::new();
        for (_, json) in self.kv_scan(GROUP_PREFIX)? {
            groups.push(serde_json::from_str::<Group>(&json)?);
        }
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(groups)
    }

    /// Look a group up by id or, failing that, by name.
    pub fn find_group(&self, id_or_name: &str) -> Result<Group, GroupError> {
        if let Some(json) = self.kv_get(&format!("{GROUP_PREFIX}{id_or_name}"))? {
            return Ok(serde_json::from_str(&json)?);
        }
        self.list_groups()?
            .into_iter()
            .find(|g| g.name == id_or_name)
            .ok_or_else(|| GroupError::GroupNotFound(id_or_name.to_string()))
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Build a CheckInRecord from a `SELECT_CHECK_IN` row
fn row_to_check_in(row: &rusqlite::Row) -> Result<CheckInRecord, rusqlite::Error> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?;

    let date: String = row.get(3)?;
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| conversion_error(3, e))?;

    let status: String = row.get(4)?;
    let status = CheckInStatus::from_str(&status).ok_or_else(|| {
        conversion_error(
            4,
            StorageError::Corrupt(format!("unknown check-in status '{status}'")),
        )
    })?;

    let record = row
        .get::<_, Option<String>>(5)?
        .map(|json| serde_json::from_str::<MicroRecord>(&json))
        .transpose()
        .map_err(|e| conversion_error(5, e))?;

    let likes: String = row.get(7)?;
    let likes = serde_json::from_str(&likes).map_err(|e| conversion_error(7, e))?;

    let timestamp: String = row.get(9)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(9, e))?;

    Ok(CheckInRecord {
        id,
        user_id: row.get(1)?,
        goal_id: row.get(2)?,
        date,
        status,
        record,
        stars_earned: row.get(6)?,
        likes,
        anonymous_encouragement: row.get(8)?,
        timestamp,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Corrupt(e.to_string()))
}

impl CheckInStore for Database {
    fn find_by_goal_and_date(
        &self,
        goal_id: &str,
        date: NaiveDate,
    ) -> Result<Option<CheckInRecord>, StorageError> {
        let sql = format!("{SELECT_CHECK_IN} WHERE goal_id = ?1 AND date = ?2");
        let record = self
            .conn
            .query_row(
                &sql,
                params![goal_id, date.format(DATE_FORMAT).to_string()],
                row_to_check_in,
            )
            .optional()?;
        Ok(record)
    }

    fn find_all_by_goal(&self, goal_id: &str) -> Result<Vec<CheckInRecord>, StorageError> {
        let sql = format!("{SELECT_CHECK_IN} WHERE goal_id = ?1 ORDER BY seq ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![goal_id], row_to_check_in)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn insert(&self, record: &CheckInRecord) -> Result<(), StorageError> {
        let micro = record.record.as_ref().map(to_json).transpose()?;
        let result = self.conn.execute(
            "INSERT INTO check_ins (id, user_id, goal_id, date, status, record, stars_earned,
                                    likes, anonymous_encouragement, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.to_string(),
                record.user_id,
                record.goal_id,
                record.date.format(DATE_FORMAT).to_string(),
                record.status.as_str(),
                micro,
                record.stars_earned,
                to_json(&record.likes)?,
                record.anonymous_encouragement,
                record.timestamp.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::Duplicate {
                    goal_id: record.goal_id.clone(),
                    date: record.date,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&self, id: Uuid, patch: &CheckInPatch) -> Result<CheckInRecord, StorageError> {
        let tx = self.conn.unchecked_transaction()?;

        let sql = format!("{SELECT_CHECK_IN} WHERE id = ?1");
        let mut record = tx
            .query_row(&sql, params![id.to_string()], row_to_check_in)
            .optional()?
            .ok_or(StorageError::RecordNotFound(id))?;
        patch.apply(&mut record);

        let micro = record.record.as_ref().map(to_json).transpose()?;
        tx.execute(
            "UPDATE check_ins
             SET record = ?2, likes = ?3, anonymous_encouragement = ?4
             WHERE id = ?1",
            params![
                id.to_string(),
                micro,
                to_json(&record.likes)?,
                record.anonymous_encouragement,
            ],
        )?;
        tx.commit()?;

        Ok(record)
    }
}

impl RewardLedger for Database {
    fn credit(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.conn.execute(
            "INSERT INTO points_ledger (user_id, delta, reason, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, amount, reason, Utc::now().to_rfc3339()],
        )?;
        self.balance(user_id)
    }

    fn debit(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let tx = self.conn.unchecked_transaction()?;
        let balance: i64 = tx.query_row(
            "SELECT COALESCE(SUM(delta), 0) FROM points_ledger WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        if balance < amount {
            return Err(LedgerError::InsufficientPoints {
                user_id: user_id.to_string(),
                balance,
                required: amount,
            });
        }
        tx.execute(
            "INSERT INTO points_ledger (user_id, delta, reason, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, -amount, reason, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(balance - amount)
    }

    fn balance(&self, user_id: &str) -> Result<i64, LedgerError> {
        let balance = self.conn.query_row(
            "SELECT COALESCE(SUM(delta), 0) FROM points_ledger WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::checkin::MicroRecordDraft;

    fn record(goal: &str, date: &str) -> CheckInRecord {
        CheckInRecord {
            id: Uuid::new_v4(),
            user_id: Some("amy".into()),
            goal_id: goal.into(),
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            status: CheckInStatus::Completed,
            record: Some(MicroRecordDraft::new("stretched").into_record(Utc::now())),
            stars_earned: 1,
            likes: BTreeSet::from(["bo".to_string()]),
            anonymous_encouragement: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn insert_and_find_round_trip() {
        let db = Database::open_memory().unwrap();
        let original = record("yoga", "2024-01-01");
        db.insert(&original).unwrap();

        let found = db
            .find_by_goal_and_date("yoga", original.date)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, original.id);
        assert_eq!(found.record, original.record);
        assert_eq!(found.likes, original.likes);
        assert_eq!(found.timestamp, original.timestamp);
    }

    #[test]
    fn duplicate_day_maps_to_duplicate_error() {
        let db = Database::open_memory().unwrap();
        db.insert(&record("yoga", "2024-01-01")).unwrap();
        let err = db.insert(&record("yoga", "2024-01-01")).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
        assert_eq!(db.find_all_by_goal("yoga").unwrap().len(), 1);
    }

    #[test]
    fn find_all_is_in_insertion_order() {
        let db = Database::open_memory().unwrap();
        db.insert(&record("yoga", "2024-01-05")).unwrap();
        db.insert(&record("yoga", "2024-01-02")).unwrap();
        db.insert(&record("walk", "2024-01-03")).unwrap();

        let dates: Vec<_> = db
            .find_all_by_goal("yoga")
            .unwrap()
            .into_iter()
            .map(|r| r.date.format(DATE_FORMAT).to_string())
            .collect();
        assert_eq!(dates, ["2024-01-05", "2024-01-02"]);
    }

    #[test]
    fn update_replaces_micro_record() {
        let db = Database::open_memory().unwrap();
        let original = record("yoga", "2024-01-01");
        db.insert(&original).unwrap();

        let patch = CheckInPatch {
            record: Some(MicroRecordDraft::new("held plank 1min").into_record(Utc::now())),
            anonymous_encouragement: Some("nice".into()),
            ..Default::default()
        };
        let updated = db.update(original.id, &patch).unwrap();
        assert_eq!(updated.record.as_ref().unwrap().text, "held plank 1min");

        let reloaded = db
            .find_by_goal_and_date("yoga", original.date)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded, updated);
    }

    #[test]
    fn update_missing_record_fails() {
        let db = Database::open_memory().unwrap();
        let err = db
            .update(Uuid::new_v4(), &CheckInPatch::default())
            .unwrap_err();
        assert!(matches!(err, StorageError::RecordNotFound(_)));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn kv_scan_matches_prefix_only() {
        let db = Database::open_memory().unwrap();
        db.kv_set("group:b", "2").unwrap();
        db.kv_set("group:a", "1").unwrap();
        db.kv_set("other", "x").unwrap();
        let keys: Vec<_> = db
            .kv_scan("group:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["group:a", "group:b"]);
    }

    #[test]
    fn groups_persist_by_id_and_name() {
        let db = Database::open_memory().unwrap();
        let mut group = Group::new("night owls");
        group.join("amy", "amy-read").unwrap();
        db.save_group(&group).unwrap();

        assert_eq!(db.find_group(&group.id.to_string()).unwrap(), group);
        assert_eq!(db.find_group("night owls").unwrap(), group);
        assert_eq!(db.list_groups().unwrap().len(), 1);
        assert!(matches!(
            db.find_group("nobody"),
            Err(GroupError::GroupNotFound(_))
        ));
    }

    #[test]
    fn ledger_credit_and_debit() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.balance("amy").unwrap(), 0);
        assert_eq!(db.credit("amy", 3, "check-in").unwrap(), 3);
        assert_eq!(db.debit("amy", 2, "sticker").unwrap(), 1);

        let err = db.debit("amy", 5, "poster").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientPoints { balance: 1, required: 5, .. }
        ));
        assert_eq!(db.balance("amy").unwrap(), 1);
        assert_eq!(db.balance("bo").unwrap(), 0);
    }
}
