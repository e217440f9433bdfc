// The XP ledger: cumulative experience per member, and the rank ordering over it.
//
// The core decides how many points to add and asks the store to add them.
// The store owns atomicity: concurrent adds for one member must never lose an update.

use super::ranks_errors::RanksError;
use super::ranks_models::{Standing, XpRecord};
use async_trait::async_trait;
use rand::Rng;

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Persistence for XP records.
///
/// Ordering everywhere is XP descending, then user ID ascending, so ties
/// always come out the same way.
#[async_trait]
pub trait XpStore: Send + Sync {
    /// Atomically add `delta` to the member's XP (creating the record at
    /// `delta` if it's new) and return the new total.
    async fn add_xp(&self, guild_id: u64, user_id: u64, delta: u64) -> Result<u64, RanksError>;

    /// Rank and XP of the member, or `None` when the member has no record.
    async fn standing(&self, guild_id: u64, user_id: u64) -> Result<Option<Standing>, RanksError>;

    /// The first `limit` records of the guild's ordering.
    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<XpRecord>, RanksError>;
}

// ============================================================================
// RANDOMNESS
// ============================================================================

/// Source of the per-message roll, injectable so tests can pin it.
pub trait PointRoll: Send + Sync {
    /// A value in `0..=max`.
    fn roll(&self, max: u32) -> u32;
}

/// Uniform roll backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformRoll;

impl PointRoll for UniformRoll {
    fn roll(&self, max: u32) -> u32 {
        rand::thread_rng().gen_range(0..=max)
    }
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct PointsLedger<S: XpStore, R: PointRoll = UniformRoll> {
    store: S,
    roll: R,
}

impl<S: XpStore> PointsLedger<S, UniformRoll> {
    pub fn new(store: S) -> Self {
        Self::with_roll(store, UniformRoll)
    }
}

impl<S: XpStore, R: PointRoll> PointsLedger<S, R> {
    pub fn with_roll(store: S, roll: R) -> Self {
        Self { store, roll }
    }

    /// Roll a delta in `0..=max_points` and add it to the member's total.
    ///
    /// Returns `(delta, new_total)`.
    pub async fn add_points(
        &self,
        guild_id: u64,
        user_id: u64,
        max_points: u32,
    ) -> Result<(u64, u64), RanksError> {
        let delta = self.roll.roll(max_points).min(max_points) as u64;
        let total = self.store.add_xp(guild_id, user_id, delta).await?;

        tracing::debug!(guild_id, user_id, delta, total, "Points added");
        Ok((delta, total))
    }

    /// Rank and XP of a member. `NotFound` if they have never been awarded.
    pub async fn query(&self, guild_id: u64, user_id: u64) -> Result<Standing, RanksError> {
        self.store
            .standing(guild_id, user_id)
            .await?
            .ok_or(RanksError::NotFound { guild_id, user_id })
    }

    /// The first `limit` members of the guild by XP.
    pub async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<XpRecord>, RanksError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store.top(guild_id, limit).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Always rolls the same value.
    pub struct FixedRoll(pub u32);

    impl PointRoll for FixedRoll {
        fn roll(&self, max: u32) -> u32 {
            self.0.min(max)
        }
    }

    /// Plays back a scripted sequence of rolls, then repeats the last one.
    pub struct ScriptedRoll(pub Mutex<VecDeque<u32>>);

    impl ScriptedRoll {
        pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
            Self(Mutex::new(rolls.into_iter().collect()))
        }
    }

    impl PointRoll for ScriptedRoll {
        fn roll(&self, max: u32) -> u32 {
            let mut rolls = self.0.lock().unwrap();
            let value = if rolls.len() > 1 {
                rolls.pop_front().unwrap_or(0)
            } else {
                rolls.front().copied().unwrap_or(0)
            };
            value.min(max)
        }
    }
}
