//! Group accountability.
//!
//! A group is a handful of members, each tracking one goal. Members can check
//! in, like each other's day, and nudge those who haven't checked in yet.
//!
//! `has_checked_in_today` and `streak` on a member are a cache of the
//! check-in history: [`GroupBoard`] recomputes them through the streak engine
//! whenever it touches a member, so they cannot drift from the records.

use std::cell::RefCell;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::{CheckInPatch, CheckInRecord};
use crate::clock::Clock;
use crate::encouragement::Encourager;
use crate::error::GroupError;
use crate::storage::CheckInStore;
use crate::streak::StreakEngine;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMember {
    pub user_id: String,
    pub goal_id: String,
    pub joined_at: DateTime<Utc>,
    pub has_checked_in_today: bool,
    pub streak: u32,
    /// Day the cached fields were last recomputed for.
    pub refreshed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberLike {
    pub liker: String,
    pub likee: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub from: String,
    pub target: String,
    pub date: NaiveDate,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub likes: Vec<MemberLike>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            members: Vec::new(),
            likes: Vec::new(),
            reminders: Vec::new(),
        }
    }

    /// Add a member tracking `goal_id`.
    pub fn join(&mut self, user_id: &str, goal_id: &str) -> Result<&GroupMember, GroupError> {
        if self.member(user_id).is_some() {
            return Err(GroupError::AlreadyMember {
                group: self.name.clone(),
                user_id: user_id.to_string(),
            });
        }
        self.members.push(GroupMember {
            user_id: user_id.to_string(),
            goal_id: goal_id.to_string(),
            joined_at: Utc::now(),
            has_checked_in_today: false,
            streak: 0,
            refreshed_on: None,
        });
        Ok(&self.members[self.members.len() - 1])
    }

    pub fn member(&self, user_id: &str) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    fn member_index(&self, user_id: &str) -> Result<usize, GroupError> {
        self.members
            .iter()
            .position(|m| m.user_id == user_id)
            .ok_or_else(|| GroupError::MemberNotFound {
                group: self.name.clone(),
                user_id: user_id.to_string(),
            })
    }

    /// Likes `likee` has received on `date`.
    pub fn likes_received(&self, likee: &str, date: NaiveDate) -> usize {
        self.likes
            .iter()
            .filter(|l| l.likee == likee && l.date == date)
            .count()
    }

    fn has_liked(&self, liker: &str, likee: &str, date: NaiveDate) -> bool {
        self.likes
            .iter()
            .any(|l| l.liker == liker && l.likee == likee && l.date == date)
    }

    fn has_reminded(&self, from: &str, target: &str, date: NaiveDate) -> bool {
        self.reminders
            .iter()
            .any(|r| r.from == from && r.target == target && r.date == date)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GroupCheckIn {
    CheckedIn { record: CheckInRecord, streak: u32 },
    /// The member had already checked in today.
    AlreadyDone { streak: u32 },
}

impl GroupCheckIn {
    pub fn streak(&self) -> u32 {
        match self {
            Self::CheckedIn { streak, .. } | Self::AlreadyDone { streak } => *streak,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LikeOutcome {
    Liked { likes_today: usize },
    AlreadyLiked { likes_today: usize },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemindOutcome {
    Reminded,
    AlreadyReminded,
}

/// Runs group actions against the check-in history.
///
/// The board holds no state of its own beyond an optional [`Encourager`]:
/// groups are passed in, mutated, and saved by the caller. Member check-ins go
/// through the same engine as solo ones, so a goal checked in alone counts as
/// done inside the group too.
pub struct GroupBoard<'e, S, C> {
    engine: &'e StreakEngine<S, C>,
    encourager: Option<RefCell<Encourager>>,
}

impl<'e, S: CheckInStore, C: Clock> GroupBoard<'e, S, C> {
    pub fn new(engine: &'e StreakEngine<S, C>) -> Self {
        Self {
            engine,
            encourager: None,
        }
    }

    /// Decorate new group check-ins the same way solo check-ins are.
    pub fn with_encourager(mut self, encourager: Encourager) -> Self {
        self.encourager = Some(RefCell::new(encourager));
        self
    }

    /// Recompute every member's cached fields for `today`.
    pub fn refresh(&self, group: &mut Group, today: NaiveDate) -> Result<(), GroupError> {
        for idx in 0..group.members.len() {
            self.refresh_member(group, idx, today)?;
        }
        Ok(())
    }

    fn refresh_member(
        &self,
        group: &mut Group,
        idx: usize,
        today: NaiveDate,
    ) -> Result<(), GroupError> {
        let member = &mut group.members[idx];
        let state = self.engine.streak_state(&member.goal_id, today)?;
        member.streak = state.current_streak_length;
        member.has_checked_in_today = state.checked_in_today;
        member.refreshed_on = Some(today);
        Ok(())
    }

    /// Check a member in. A second attempt the same day reports the streak
    /// instead of failing.
    pub fn check_in(
        &self,
        group: &mut Group,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<GroupCheckIn, GroupError> {
        let idx = group.member_index(user_id)?;
        let goal_id = group.members[idx].goal_id.clone();

        let created = match self
            .engine
            .record_check_in(&goal_id, Some(user_id), today, None)
        {
            Ok(record) => Some(match &self.encourager {
                Some(enc) => enc.borrow_mut().persist(self.engine.store(), record),
                None => record,
            }),
            Err(e) if e.is_already_checked_in() => None,
            Err(e) => return Err(e.into()),
        };

        self.refresh_member(group, idx, today)?;
        let streak = group.members[idx].streak;

        Ok(match created {
            Some(record) => {
                tracing::info!(group = %group.name, user_id, streak, "group check-in");
                GroupCheckIn::CheckedIn { record, streak }
            }
            None => GroupCheckIn::AlreadyDone { streak },
        })
    }

    /// Like another member's day. Repeats on the same day change nothing.
    ///
    /// If the likee has a check-in today, the liker is also added to that
    /// record's likes.
    pub fn like(
        &self,
        group: &mut Group,
        liker: &str,
        likee: &str,
        today: NaiveDate,
    ) -> Result<LikeOutcome, GroupError> {
        if liker == likee {
            return Err(GroupError::SelfTarget);
        }
        group.member_index(liker)?;
        let likee_idx = group.member_index(likee)?;

        if group.has_liked(liker, likee, today) {
            return Ok(LikeOutcome::AlreadyLiked {
                likes_today: group.likes_received(likee, today),
            });
        }

        group.likes.push(MemberLike {
            liker: liker.to_string(),
            likee: likee.to_string(),
            date: today,
        });

        let goal_id = group.members[likee_idx].goal_id.clone();
        if let Some(record) = self.engine.today_check_in(&goal_id, today)? {
            let mut likes = record.likes.clone();
            if likes.insert(liker.to_string()) {
                let patch = CheckInPatch {
                    likes: Some(likes),
                    ..Default::default()
                };
                self.engine.store().update(record.id, &patch)?;
            }
        }
        self.refresh_member(group, likee_idx, today)?;

        Ok(LikeOutcome::Liked {
            likes_today: group.likes_received(likee, today),
        })
    }

    /// Nudge a member who has not checked in today.
    pub fn remind(
        &self,
        group: &mut Group,
        from: &str,
        target: &str,
        today: NaiveDate,
    ) -> Result<RemindOutcome, GroupError> {
        if from == target {
            return Err(GroupError::SelfTarget);
        }
        group.member_index(from)?;
        let target_idx = group.member_index(target)?;

        self.refresh_member(group, target_idx, today)?;
        if group.members[target_idx].has_checked_in_today {
            return Err(GroupError::TargetAlreadyCheckedIn {
                user_id: target.to_string(),
            });
        }

        if group.has_reminded(from, target, today) {
            return Ok(RemindOutcome::AlreadyReminded);
        }

        group.reminders.push(Reminder {
            from: from.to_string(),
            target: target.to_string(),
            date: today,
            sent_at: self.engine.clock().now(),
        });
        tracing::info!(group = %group.name, from, target, "reminder sent");
        Ok(RemindOutcome::Reminded)
    }
}
