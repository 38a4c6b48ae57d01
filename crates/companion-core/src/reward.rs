//! Reward and badge unlock rules.
//!
//! A reward unlocks from a goal's streak figures. When both thresholds are
//! set, both must be met at the same time.

use serde::{Deserialize, Serialize};

use crate::checkin::GoalStreakState;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_days_required: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_days_required: Option<u32>,
}

impl RewardRequirement {
    /// At least one threshold must be present.
    pub fn new(
        consecutive_days_required: Option<u32>,
        cumulative_days_required: Option<u32>,
    ) -> Result<Self, ValidationError> {
        if consecutive_days_required.is_none() && cumulative_days_required.is_none() {
            return Err(ValidationError::MissingRequirement);
        }
        Ok(Self {
            consecutive_days_required,
            cumulative_days_required,
        })
    }

    pub fn consecutive(days: u32) -> Self {
        Self {
            consecutive_days_required: Some(days),
            cumulative_days_required: None,
        }
    }

    pub fn cumulative(days: u32) -> Self {
        Self {
            consecutive_days_required: None,
            cumulative_days_required: Some(days),
        }
    }

    /// A requirement with neither threshold never unlocks.
    pub fn is_met(&self, current_streak: u32, cumulative_count: u32) -> bool {
        match (self.consecutive_days_required, self.cumulative_days_required) {
            (Some(streak), None) => current_streak >= streak,
            (None, Some(total)) => cumulative_count >= total,
            (Some(streak), Some(total)) => current_streak >= streak && cumulative_count >= total,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reward {
    pub id: String,
    pub name: String,
    /// Points spent on redemption; 0 for badges.
    #[serde(default)]
    pub cost_points: i64,
    pub requirement: RewardRequirement,
}

impl Reward {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        requirement: RewardRequirement,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost_points: 0,
            requirement,
        }
    }

    pub fn with_cost(mut self, cost_points: i64) -> Self {
        self.cost_points = cost_points;
        self
    }

    pub fn is_unlocked(&self, state: &GoalStreakState) -> bool {
        self.requirement
            .is_met(state.current_streak_length, state.cumulative_count)
    }
}

/// The rewards from `catalog` that `state` unlocks, in catalog order.
pub fn unlocked_rewards<'a>(catalog: &'a [Reward], state: &GoalStreakState) -> Vec<&'a Reward> {
    catalog.iter().filter(|r| r.is_unlocked(state)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(streak: u32, cumulative: u32) -> GoalStreakState {
        GoalStreakState {
            is_alive_today: streak > 0,
            current_streak_length: streak,
            cumulative_count: cumulative,
            checked_in_today: false,
        }
    }

    #[test]
    fn consecutive_only() {
        let req = RewardRequirement::consecutive(7);
        assert!(!req.is_met(6, 100));
        assert!(req.is_met(7, 7));
    }

    #[test]
    fn cumulative_only() {
        let req = RewardRequirement::cumulative(30);
        assert!(!req.is_met(29, 29));
        assert!(req.is_met(0, 30));
    }

    #[test]
    fn both_thresholds_need_both() {
        let req = RewardRequirement::new(Some(3), Some(10)).unwrap();
        assert!(!req.is_met(3, 5));
        assert!(!req.is_met(1, 12));
        assert!(req.is_met(3, 10));
    }

    #[test]
    fn requirement_needs_a_threshold() {
        assert_eq!(
            RewardRequirement::new(None, None),
            Err(ValidationError::MissingRequirement)
        );
        assert!(!RewardRequirement::default().is_met(u32::MAX, u32::MAX));
    }

    #[test]
    fn unlocked_rewards_filters_catalog() {
        let catalog = vec![
            Reward::new("first-week", "First week", RewardRequirement::consecutive(7)),
            Reward::new("ten", "Ten check-ins", RewardRequirement::cumulative(10)),
            Reward::new(
                "steady",
                "Steady",
                RewardRequirement::new(Some(3), Some(10)).unwrap(),
            )
            .with_cost(5),
        ];

        let names: Vec<_> = unlocked_rewards(&catalog, &state(3, 10))
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(names, ["ten", "steady"]);
    }
}
