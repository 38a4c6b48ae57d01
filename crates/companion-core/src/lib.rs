//! # Little Companion Core Library
//!
//! Core logic for Little Companion, a micro-habit tracker: users check in on
//! their goals once a day, keep streaks alive, earn points, and hold each
//! other accountable in small groups. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Streak Engine**: records one check-in per goal per day and derives
//!   streak length and cumulative counts from the history. `today` is always
//!   supplied by the caller.
//! - **Storage**: a [`CheckInStore`] port with SQLite and in-memory
//!   implementations, plus TOML-based configuration
//! - **Rewards**: unlock rules and a point ledger the caller credits
//! - **Groups**: accountability bookkeeping on top of the engine
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: check-in recording and streak computation
//! - [`CheckInService`]: engine + encouragement + ledger in one call
//! - [`Database`]: SQLite persistence
//! - [`Config`]: Application configuration management

pub mod checkin;
pub mod clock;
pub mod encouragement;
pub mod error;
pub mod group;
pub mod ledger;
pub mod reward;
pub mod service;
pub mod storage;
pub mod streak;

pub use checkin::{
    CheckInPatch, CheckInRecord, CheckInStatus, GoalStreakState, MicroRecord, MicroRecordDraft,
    MAX_RECORD_TEXT_CHARS,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use encouragement::Encourager;
pub use error::{
    CheckInError, ConfigError, CoreError, GroupError, LedgerError, StorageError, ValidationError,
};
pub use group::{Group, GroupBoard, GroupCheckIn, GroupMember, LikeOutcome, RemindOutcome};
pub use ledger::{redeem, MemoryLedger, RewardLedger};
pub use reward::{unlocked_rewards, Reward, RewardRequirement};
pub use service::{CheckInOutcome, CheckInService};
pub use storage::{CheckInStore, Config, Database, MemoryStore};
pub use streak::{EngineConfig, StreakEngine};
