// Domain models for the ranking system.
// Plain data only: IDs are raw u64 snowflakes so nothing here depends on serenity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cooldown used when a community has never been configured.
pub const DEFAULT_COOLDOWN_SECS: u64 = 0;

/// Upper bound of the per-message roll when a community has never been configured.
pub const DEFAULT_MAX_POINTS: u32 = 25;

/// Per-community ranking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySettings {
    pub guild_id: u64,
    /// Seconds that must strictly elapse between two awards for the same member.
    pub cooldown_secs: u64,
    /// Inclusive upper bound of the random award per eligible message.
    pub max_points: u32,
}

impl CommunitySettings {
    pub fn defaults_for(guild_id: u64) -> Self {
        Self {
            guild_id,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

/// Connection details for the SQL backend that holds the XP ledger.
///
/// These are process-wide rather than per-community: every guild the bot
/// serves shares one ledger database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

// Hand-written so the password never ends up in a log line.
impl std::fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The whole settings file as it lives on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub communities: HashMap<u64, CommunitySettings>,
    #[serde(default)]
    pub credentials: Option<BackendCredentials>,
}

/// A chat message as seen by the award pipeline.
#[derive(Debug, Clone, Copy)]
pub struct InboundMessage {
    pub guild_id: u64,
    pub user_id: u64,
    pub is_bot: bool,
    pub is_private_channel: bool,
    /// Unix time in seconds.
    pub timestamp: f64,
}

/// Cumulative XP of one member in one community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRecord {
    pub user_id: u64,
    pub guild_id: u64,
    pub xp: u64,
}

/// Position of a member in the full ordering of a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    /// 1-based.
    pub rank: u64,
    pub xp: u64,
}

/// Result of a successful award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub guild_id: u64,
    pub user_id: u64,
    pub delta: u64,
    pub total_xp: u64,
}

/// Everything the `/rank` command shows about a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankRow {
    pub rank: u64,
    pub user_id: u64,
    pub level: u32,
    /// XP earned since the current level started.
    pub xp_in_level: u64,
    /// XP the current level spans in total.
    pub xp_for_level: u64,
    pub total_xp: u64,
}

/// One visible line of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// Position among visible rows only, starting at 1.
    pub position: usize,
    pub user_id: u64,
    pub display_name: String,
    pub xp: u64,
}
