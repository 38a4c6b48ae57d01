use clap::Subcommand;
use companion_core::{Encourager, Group, GroupBoard, GroupCheckIn, RewardLedger};
use serde_json::json;

use super::{open_db, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a group
    Create {
        /// Group name
        name: String,
    },
    /// Join a group with one of your goals
    Join {
        /// Group id or name
        group: String,
        /// Goal tracked inside the group
        goal: String,
    },
    /// Show a group with fresh member figures
    Show {
        /// Group id or name
        group: String,
    },
    /// List all groups
    List,
    /// Check in your group goal for today
    Checkin {
        /// Group id or name
        group: String,
    },
    /// Like another member's day
    Like {
        /// Group id or name
        group: String,
        /// Member being liked
        member: String,
    },
    /// Remind a member who has not checked in today
    Remind {
        /// Group id or name
        group: String,
        /// Member being reminded
        member: String,
    },
}

pub fn run(action: GroupAction, ctx: &Context) -> CmdResult {
    let db = open_db()?;
    let engine = ctx.engine(&db);
    let encourager = Encourager::from_config(&ctx.config.encouragement);
    let board = GroupBoard::new(&engine).with_encourager(encourager);

    match action {
        GroupAction::Create { name } => {
            if db.find_group(&name).is_ok() {
                return Err(format!("group '{name}' already exists").into());
            }
            let group = Group::new(name);
            db.save_group(&group)?;
            print_json(&group)?;
        }
        GroupAction::Join { group, goal } => {
            let user = ctx.require_user()?;
            let mut group = db.find_group(&group)?;
            group.join(user, &goal)?;
            board.refresh(&mut group, ctx.today)?;
            db.save_group(&group)?;
            print_json(&group)?;
        }
        GroupAction::Show { group } => {
            let mut group = db.find_group(&group)?;
            board.refresh(&mut group, ctx.today)?;
            db.save_group(&group)?;
            print_json(&group)?;
        }
        GroupAction::List => {
            let groups = db.list_groups()?;
            let summary: Vec<_> = groups
                .iter()
                .map(|g| json!({ "id": g.id, "name": g.name, "members": g.members.len() }))
                .collect();
            print_json(&summary)?;
        }
        GroupAction::Checkin { group } => {
            let user = ctx.require_user()?;
            let mut group = db.find_group(&group)?;
            let outcome = board.check_in(&mut group, user, ctx.today)?;

            let mut balance = None;
            if let GroupCheckIn::CheckedIn { record, .. } = &outcome {
                if record.stars_earned > 0 {
                    let reason = format!("check-in:{}:{}", record.goal_id, ctx.today);
                    balance = Some(db.credit(user, i64::from(record.stars_earned), &reason)?);
                }
            }
            db.save_group(&group)?;
            print_json(&json!({ "result": outcome, "balance": balance }))?;
        }
        GroupAction::Like { group, member } => {
            let user = ctx.require_user()?;
            let mut group = db.find_group(&group)?;
            let outcome = board.like(&mut group, user, &member, ctx.today)?;
            db.save_group(&group)?;
            print_json(&outcome)?;
        }
        GroupAction::Remind { group, member } => {
            let user = ctx.require_user()?;
            let mut group = db.find_group(&group)?;
            let outcome = board.remind(&mut group, user, &member, ctx.today)?;
            db.save_group(&group)?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}
