//! Check-in data model.
//!
//! A [`CheckInRecord`] marks one goal as done for one calendar day. At most one
//! record may exist per `(goal_id, date)`; the stores enforce it.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Default character limit for micro-record text.
pub const MAX_RECORD_TEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Completed,
    /// Reserved for backfill; never created by the engine.
    Missed,
}

impl CheckInStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "missed" => Some(Self::Missed),
            _ => None,
        }
    }
}

/// Short note (and optional picture) attached to a day's check-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MicroRecord {
    pub id: Uuid,
    pub text: String,
    /// Opaque reference to an uploaded image.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-side input for a micro-record, before it gets an id and timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MicroRecordDraft {
    pub text: String,
    pub image: Option<String>,
}

impl MicroRecordDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Check the text length against `max_chars` (counted in characters, not bytes).
    ///
    /// The engine stores whatever it is given; callers run this first.
    pub fn validate(&self, max_chars: usize) -> Result<(), ValidationError> {
        let len = self.text.chars().count();
        if len > max_chars {
            return Err(ValidationError::TextTooLong {
                len,
                max: max_chars,
            });
        }
        Ok(())
    }

    pub(crate) fn into_record(self, created_at: DateTime<Utc>) -> MicroRecord {
        MicroRecord {
            id: Uuid::new_v4(),
            text: self.text,
            image: self.image,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub goal_id: String,
    /// Local calendar day bucket, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub status: CheckInStatus,
    pub record: Option<MicroRecord>,
    pub stars_earned: u32,
    #[serde(default)]
    pub likes: BTreeSet<String>,
    pub anonymous_encouragement: Option<String>,
    /// Creation instant; the streak sort key.
    pub timestamp: DateTime<Utc>,
}

impl CheckInRecord {
    pub fn is_completed(&self) -> bool {
        self.status == CheckInStatus::Completed
    }
}

/// Partial update applied by [`CheckInStore::update`](crate::storage::CheckInStore::update).
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInPatch {
    pub record: Option<MicroRecord>,
    pub anonymous_encouragement: Option<String>,
    pub likes: Option<BTreeSet<String>>,
}

impl CheckInPatch {
    pub fn apply(&self, target: &mut CheckInRecord) {
        if let Some(record) = &self.record {
            target.record = Some(record.clone());
        }
        if let Some(phrase) = &self.anonymous_encouragement {
            target.anonymous_encouragement = Some(phrase.clone());
        }
        if let Some(likes) = &self.likes {
            target.likes = likes.clone();
        }
    }
}

/// Derived streak view of a goal. Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalStreakState {
    pub is_alive_today: bool,
    pub current_streak_length: u32,
    pub cumulative_count: u32,
    pub checked_in_today: bool,
}
