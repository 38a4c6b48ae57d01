use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "companion-cli", version, about = "Little Companion CLI")]
struct Cli {
    /// Acting user id
    #[arg(long, global = true, env = "COMPANION_USER")]
    user: Option<String>,

    /// Treat this day (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily check-ins and streaks
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Reward unlocks and redemption
    Reward {
        #[command(subcommand)]
        action: commands::reward::RewardAction,
    },
    /// Reward point balance
    Points {
        #[command(subcommand)]
        action: commands::points::PointsAction,
    },
    /// Accountability groups
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "companion_core=info,companion_cli=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = Context::new(cli.user, cli.date);

    let result = match cli.command {
        Commands::Checkin { action } => commands::checkin::run(action, &ctx),
        Commands::Reward { action } => commands::reward::run(action, &ctx),
        Commands::Points { action } => commands::points::run(action, &ctx),
        Commands::Group { action } => commands::group::run(action, &ctx),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
