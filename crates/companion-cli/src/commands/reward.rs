use clap::{Args, Subcommand};
use companion_core::{redeem, Reward, RewardRequirement};
use serde_json::json;

use super::{open_db, print_json, CmdResult, Context};

#[derive(Args)]
pub struct Thresholds {
    /// Goal whose streak figures are checked
    goal: String,
    /// Consecutive days required
    #[arg(long)]
    consecutive: Option<u32>,
    /// Cumulative days required
    #[arg(long)]
    cumulative: Option<u32>,
}

#[derive(Subcommand)]
pub enum RewardAction {
    /// Check whether a goal meets the given thresholds
    Check {
        #[command(flatten)]
        thresholds: Thresholds,
    },
    /// Spend points on a reward once the goal has unlocked it
    Redeem {
        /// Reward name
        name: String,
        /// Point cost (0 for a badge)
        #[arg(long, default_value_t = 0)]
        cost: i64,
        #[command(flatten)]
        thresholds: Thresholds,
    },
}

fn requirement(t: &Thresholds) -> Result<RewardRequirement, Box<dyn std::error::Error>> {
    Ok(RewardRequirement::new(t.consecutive, t.cumulative)?)
}

pub fn run(action: RewardAction, ctx: &Context) -> CmdResult {
    let db = open_db()?;
    let engine = ctx.engine(&db);
    match action {
        RewardAction::Check { thresholds } => {
            let requirement = requirement(&thresholds)?;
            let state = engine.streak_state(&thresholds.goal, ctx.today)?;
            print_json(&json!({
                "goal_id": thresholds.goal,
                "requirement": requirement,
                "state": state,
                "unlocked": requirement.is_met(state.current_streak_length, state.cumulative_count),
            }))?;
        }
        RewardAction::Redeem {
            name,
            cost,
            thresholds,
        } => {
            let user = ctx.require_user()?;
            let reward = Reward::new(name.clone(), name, requirement(&thresholds)?).with_cost(cost);
            let state = engine.streak_state(&thresholds.goal, ctx.today)?;
            if !reward.is_unlocked(&state) {
                let message = format!(
                    "reward '{}' is still locked for {}",
                    reward.name, thresholds.goal
                );
                return Err(message.into());
            }
            let balance = redeem(&db, user, &reward)?;
            print_json(&json!({
                "reward": reward,
                "balance": balance,
            }))?;
        }
    }
    Ok(())
}
