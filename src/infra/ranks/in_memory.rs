// In-memory implementation of XpStore.
//
// Nothing survives a restart, so this only backs the unit tests.
// It follows the same ordering rules as the SQL stores.

use crate::core::ranks::{RanksError, Standing, XpRecord, XpStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;

/// We need both user_id AND guild_id since users can be in multiple guilds.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct UserGuildKey {
    user_id: u64,
    guild_id: u64,
}

/// **DashMap:** a concurrent HashMap. `entry()` locks the key's shard for
/// the whole read-modify-write, which is what keeps `add_xp` atomic.
#[derive(Default)]
pub struct InMemoryXpStore {
    data: DashMap<UserGuildKey, u64>,
}

impl InMemoryXpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guild_records(&self, guild_id: u64) -> Vec<XpRecord> {
        self.data
            .iter()
            .filter(|entry| entry.key().guild_id == guild_id)
            .map(|entry| XpRecord {
                user_id: entry.key().user_id,
                guild_id,
                xp: *entry.value(),
            })
            .collect()
    }
}

/// XP descending, then user ID ascending.
pub(crate) fn leaderboard_order(a: &XpRecord, b: &XpRecord) -> Ordering {
    b.xp.cmp(&a.xp).then(a.user_id.cmp(&b.user_id))
}

#[async_trait]
impl XpStore for InMemoryXpStore {
    async fn add_xp(&self, guild_id: u64, user_id: u64, delta: u64) -> Result<u64, RanksError> {
        let key = UserGuildKey { user_id, guild_id };

        let mut entry = self.data.entry(key).or_insert(0);
        *entry = entry.saturating_add(delta);
        Ok(*entry)
    }

    async fn standing(&self, guild_id: u64, user_id: u64) -> Result<Option<Standing>, RanksError> {
        let key = UserGuildKey { user_id, guild_id };
        let Some(xp) = self.data.get(&key).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        let me = XpRecord {
            user_id,
            guild_id,
            xp,
        };

        let ahead = self
            .guild_records(guild_id)
            .iter()
            .filter(|other| leaderboard_order(other, &me) == Ordering::Less)
            .count() as u64;

        Ok(Some(Standing {
            rank: ahead + 1,
            xp,
        }))
    }

    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<XpRecord>, RanksError> {
        let mut records = self.guild_records(guild_id);
        records.sort_by(leaderboard_order);
        records.truncate(limit);
        Ok(records)
    }
}
