// Read side of the ranking system: a member's rank card and the leaderboard.

use super::level_curve::level_of;
use super::points_ledger::{PointRoll, PointsLedger, UniformRoll, XpStore};
use super::ranks_errors::RanksError;
use super::ranks_models::{LeaderboardRow, RankRow};
use std::collections::HashMap;
use std::sync::Arc;

/// Rows shown by default on the leaderboard.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// How many ledger rows are read before filtering out departed members.
pub const LEADERBOARD_FETCH_WINDOW: usize = 20;

/// Who is currently in a guild, and what they are called there.
pub trait MemberRoster {
    fn display_name(&self, user_id: u64) -> Option<String>;
}

impl MemberRoster for HashMap<u64, String> {
    fn display_name(&self, user_id: u64) -> Option<String> {
        self.get(&user_id).cloned()
    }
}

pub struct RankQueryService<S: XpStore, R: PointRoll = UniformRoll> {
    ledger: Arc<PointsLedger<S, R>>,
}

impl<S: XpStore, R: PointRoll> RankQueryService<S, R> {
    pub fn new(ledger: Arc<PointsLedger<S, R>>) -> Self {
        Self { ledger }
    }

    /// Rank, level and level progress of one member.
    pub async fn format_rank(&self, guild_id: u64, user_id: u64) -> Result<RankRow, RanksError> {
        let standing = self.ledger.query(guild_id, user_id).await?;
        let progress = level_of(standing.xp);

        Ok(RankRow {
            rank: standing.rank,
            user_id,
            level: progress.level,
            xp_in_level: progress.xp_in_level(standing.xp),
            xp_for_level: progress.xp_for_next_level,
            total_xp: standing.xp,
        })
    }

    /// Top members who are still in the guild.
    ///
    /// Members missing from `roster` are skipped and the visible rows are
    /// numbered 1..N, so the shown positions have no gaps.
    pub async fn format_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
        roster: &impl MemberRoster,
    ) -> Result<Vec<LeaderboardRow>, RanksError> {
        let records = self
            .ledger
            .top(guild_id, LEADERBOARD_FETCH_WINDOW.max(limit))
            .await?;

        let rows = records
            .into_iter()
            .filter_map(|record| {
                roster
                    .display_name(record.user_id)
                    .map(|name| (record, name))
            })
            .take(limit)
            .enumerate()
            .map(|(index, (record, display_name))| LeaderboardRow {
                position: index + 1,
                user_id: record.user_id,
                display_name,
                xp: record.xp,
            })
            .collect();

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranks::points_ledger::test_support::ScriptedRoll;
    use crate::infra::ranks::InMemoryXpStore;

    async fn seeded(awards: &[(u64, u32)]) -> RankQueryService<InMemoryXpStore, ScriptedRoll> {
        let ledger = Arc::new(PointsLedger::with_roll(
            InMemoryXpStore::new(),
            ScriptedRoll::new(awards.iter().map(|(_, xp)| *xp)),
        ));
        for (user_id, xp) in awards {
            ledger.add_points(1, *user_id, *xp).await.unwrap();
        }
        RankQueryService::new(ledger)
    }

    fn roster(members: &[u64]) -> HashMap<u64, String> {
        members.iter().map(|id| (*id, format!("member-{id}"))).collect()
    }

    #[tokio::test]
    async fn rank_card_includes_level_progress() {
        let service = seeded(&[(10, 300), (11, 500)]).await;

        let row = service.format_rank(1, 10).await.unwrap();
        assert_eq!(row.rank, 2);
        assert_eq!(row.level, 2);
        assert_eq!(row.xp_in_level, 45);
        assert_eq!(row.xp_for_level, 220);
        assert_eq!(row.total_xp, 300);
    }

    #[tokio::test]
    async fn rank_of_untracked_member_is_not_found() {
        let service = seeded(&[(10, 300)]).await;
        let err = service.format_rank(1, 77).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn departed_members_are_skipped_and_renumbered() {
        let service = seeded(&[(1, 500), (2, 400), (3, 300), (4, 200), (5, 100)]).await;

        // 1, 3 and 4 have left the guild.
        let rows = service
            .format_leaderboard(1, DEFAULT_LEADERBOARD_SIZE, &roster(&[2, 5]))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].position, rows[0].user_id), (1, 2));
        assert_eq!((rows[1].position, rows[1].user_id), (2, 5));
        assert_eq!(rows[0].display_name, "member-2");
    }

    #[tokio::test]
    async fn leaderboard_stops_at_the_limit() {
        let awards: Vec<(u64, u32)> = (1..=15).map(|id| (id, 1_000 - id as u32)).collect();
        let service = seeded(&awards).await;
        let everyone: Vec<u64> = (1..=15).collect();

        let rows = service
            .format_leaderboard(1, DEFAULT_LEADERBOARD_SIZE, &roster(&everyone))
            .await
            .unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows.last().unwrap().position, 10);
        assert!(rows.windows(2).all(|w| w[0].xp > w[1].xp));
    }
}
