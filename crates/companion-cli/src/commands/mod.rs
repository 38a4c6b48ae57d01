pub mod checkin;
pub mod config;
pub mod group;
pub mod points;
pub mod reward;

use chrono::NaiveDate;
use companion_core::{Clock, Config, EngineConfig, StreakEngine, SystemClock};
use companion_core::{CheckInStore, Database};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Per-invocation settings shared by all subcommands.
pub struct Context {
    pub user: Option<String>,
    pub today: NaiveDate,
    pub config: Config,
}

impl Context {
    pub fn new(user: Option<String>, date: Option<NaiveDate>) -> Self {
        Self {
            user,
            today: date.unwrap_or_else(|| SystemClock.today()),
            config: Config::load_or_default(),
        }
    }

    pub fn require_user(&self) -> Result<&str, Box<dyn std::error::Error>> {
        self.user
            .as_deref()
            .ok_or_else(|| "this command needs --user (or COMPANION_USER)".into())
    }

    pub fn engine<S: CheckInStore>(&self, store: S) -> StreakEngine<S> {
        StreakEngine::new(store).with_config(EngineConfig::from(&self.config.check_in))
    }
}

pub fn open_db() -> Result<Database, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    tracing::debug!("database opened");
    Ok(db)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
