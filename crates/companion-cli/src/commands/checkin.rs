use clap::Subcommand;
use companion_core::{CheckInOutcome, CheckInService, Encourager, MicroRecordDraft};

use super::{open_db, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Check in a goal for today
    Record {
        /// Goal id
        goal: String,
        /// Short note for today's micro-record
        #[arg(long)]
        text: Option<String>,
        /// Image reference for the micro-record (requires --text)
        #[arg(long, requires = "text")]
        image: Option<String>,
    },
    /// Show today's check-in for a goal
    Today {
        /// Goal id
        goal: String,
    },
    /// Attach or replace the micro-record on today's check-in
    Attach {
        /// Goal id
        goal: String,
        /// Note text
        text: String,
        /// Image reference
        #[arg(long)]
        image: Option<String>,
    },
    /// Show streak figures for a goal
    Streak {
        /// Goal id
        goal: String,
    },
    /// List every check-in for a goal, newest first
    History {
        /// Goal id
        goal: String,
    },
}

fn build_draft(
    ctx: &Context,
    text: String,
    image: Option<String>,
) -> Result<MicroRecordDraft, Box<dyn std::error::Error>> {
    let mut draft = MicroRecordDraft::new(text);
    if let Some(image) = image {
        draft = draft.with_image(image);
    }
    draft.validate(ctx.config.check_in.max_record_text_chars)?;
    Ok(draft)
}

pub fn run(action: CheckinAction, ctx: &Context) -> CmdResult {
    let db = open_db()?;
    match action {
        CheckinAction::Record { goal, text, image } => {
            let draft = text.map(|t| build_draft(ctx, t, image)).transpose()?;
            let encourager = Encourager::from_config(&ctx.config.encouragement);
            let mut service = CheckInService::new(ctx.engine(&db), &db, encourager);
            let outcome = service.check_in(ctx.user.as_deref(), &goal, ctx.today, draft)?;
            if let CheckInOutcome::AlreadyDone { .. } = outcome {
                eprintln!("{goal} is already checked in for {}", ctx.today);
            }
            print_json(&outcome)?;
        }
        CheckinAction::Today { goal } => {
            let record = ctx.engine(&db).today_check_in(&goal, ctx.today)?;
            print_json(&record)?;
        }
        CheckinAction::Attach { goal, text, image } => {
            let draft = build_draft(ctx, text, image)?;
            let record = ctx.engine(&db).attach_record_to_today(
                &goal,
                ctx.today,
                &draft.text,
                draft.image.as_deref(),
            )?;
            print_json(&record)?;
        }
        CheckinAction::Streak { goal } => {
            let state = ctx.engine(&db).streak_state(&goal, ctx.today)?;
            print_json(&state)?;
        }
        CheckinAction::History { goal } => {
            let records = ctx.engine(&db).history(&goal)?;
            print_json(&records)?;
        }
    }
    Ok(())
}
