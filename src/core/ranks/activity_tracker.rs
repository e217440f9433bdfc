// Cooldown tracking: remembers when each member was last awarded XP.
//
// The map lives in memory. Losing it on restart is fine: a member with no
// record is simply eligible again.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Composite key, since a user can be in many guilds.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct MemberKey {
    guild_id: u64,
    user_id: u64,
}

/// Last award time of one member, in the shape used for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastSpokeRecord {
    pub guild_id: u64,
    pub user_id: u64,
    /// Unix time in seconds.
    pub timestamp: f64,
}

/// Decides whether a message is far enough from the member's previous award.
///
/// **DashMap:** the entry API holds the shard lock for the key while we read
/// and write, so two messages racing for the same member can't both pass.
#[derive(Default)]
pub struct ActivityTracker {
    last_award: DashMap<MemberKey, f64>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the cooldown and, when the member is eligible, record
    /// `timestamp` as their last award time in the same step.
    ///
    /// Eligible iff no record exists or `timestamp - last > cooldown_secs`.
    /// A gap of exactly `cooldown_secs` is not enough.
    pub fn check_eligible(
        &self,
        guild_id: u64,
        user_id: u64,
        timestamp: f64,
        cooldown_secs: u64,
    ) -> bool {
        match self.last_award.entry(MemberKey { guild_id, user_id }) {
            Entry::Vacant(vacant) => {
                tracing::info!(
                    guild_id,
                    user_id,
                    "Member has not spoken since last restart, adding new timestamp"
                );
                vacant.insert(timestamp);
                true
            }
            Entry::Occupied(mut occupied) => {
                if timestamp - *occupied.get() > cooldown_secs as f64 {
                    occupied.insert(timestamp);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Last award time of a member, if any.
    #[cfg(test)]
    pub fn last_award(&self, guild_id: u64, user_id: u64) -> Option<f64> {
        self.last_award
            .get(&MemberKey { guild_id, user_id })
            .map(|entry| *entry.value())
    }

    pub fn snapshot(&self) -> Vec<LastSpokeRecord> {
        self.last_award
            .iter()
            .map(|entry| LastSpokeRecord {
                guild_id: entry.key().guild_id,
                user_id: entry.key().user_id,
                timestamp: *entry.value(),
            })
            .collect()
    }

    /// Load records from a snapshot. Newer in-memory timestamps win.
    pub fn restore(&self, records: impl IntoIterator<Item = LastSpokeRecord>) {
        for record in records {
            let key = MemberKey {
                guild_id: record.guild_id,
                user_id: record.user_id,
            };
            self.last_award
                .entry(key)
                .and_modify(|ts| {
                    if record.timestamp > *ts {
                        *ts = record.timestamp;
                    }
                })
                .or_insert(record.timestamp);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_award.len()
    }
}
