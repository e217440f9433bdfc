// Ranking system: cooldowns, XP ledger, levels, settings.
#![allow(unused_imports)]

pub mod activity_tracker;
pub mod credential_setup;
pub mod level_curve;
pub mod points_ledger;
pub mod rank_query;
pub mod ranks_errors;
pub mod ranks_models;
pub mod ranks_service;
pub mod settings_service;

pub use activity_tracker::{ActivityTracker, LastSpokeRecord};
pub use credential_setup::{CredentialSetup, SETUP_STEP_TIMEOUT};
pub use level_curve::{level_of, LevelProgress};
pub use points_ledger::{PointRoll, PointsLedger, UniformRoll, XpStore};
pub use rank_query::{MemberRoster, RankQueryService, DEFAULT_LEADERBOARD_SIZE};
pub use ranks_errors::RanksError;
pub use ranks_models::{
    Award, BackendCredentials, CommunitySettings, InboundMessage, LeaderboardRow, RankRow,
    SettingsDocument, Standing, XpRecord,
};
pub use ranks_service::RanksService;
pub use settings_service::{SettingsService, SettingsStore};
