use clap::Subcommand;
use companion_core::RewardLedger;
use serde_json::json;

use super::{open_db, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum PointsAction {
    /// Show the acting user's point balance
    Balance,
}

pub fn run(action: PointsAction, ctx: &Context) -> CmdResult {
    match action {
        PointsAction::Balance => {
            let user = ctx.require_user()?;
            let balance = open_db()?.balance(user)?;
            print_json(&json!({ "user_id": user, "balance": balance }))?;
        }
    }
    Ok(())
}
