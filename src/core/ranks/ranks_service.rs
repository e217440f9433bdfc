// The award pipeline: one inbound message in, at most one award out.
//
// message -> cooldown check (ActivityTracker) -> roll and add (PointsLedger)
//
// Like the rest of core, nothing here knows about Discord.

use super::activity_tracker::ActivityTracker;
use super::points_ledger::{PointRoll, PointsLedger, UniformRoll, XpStore};
use super::ranks_errors::RanksError;
use super::ranks_models::{Award, InboundMessage};
use super::settings_service::{SettingsService, SettingsStore};
use std::sync::Arc;

pub struct RanksService<X: XpStore, C: SettingsStore, R: PointRoll = UniformRoll> {
    settings: Arc<SettingsService<C>>,
    tracker: Arc<ActivityTracker>,
    ledger: Arc<PointsLedger<X, R>>,
}

impl<X: XpStore, C: SettingsStore, R: PointRoll> RanksService<X, C, R> {
    pub fn new(
        settings: Arc<SettingsService<C>>,
        tracker: Arc<ActivityTracker>,
        ledger: Arc<PointsLedger<X, R>>,
    ) -> Self {
        Self {
            settings,
            tracker,
            ledger,
        }
    }

    /// Award points for a message if it qualifies.
    ///
    /// **Returns:**
    /// - `Ok(Some(Award))` when points were added (the roll may be 0)
    /// - `Ok(None)` for bots, private channels and members still on cooldown
    /// - `Err(BackendUnavailable)` if the ledger could not be updated
    pub async fn process_message(
        &self,
        message: &InboundMessage,
    ) -> Result<Option<Award>, RanksError> {
        if message.is_bot || message.is_private_channel {
            return Ok(None);
        }

        let settings = self.settings.get(message.guild_id).await;
        if !self.tracker.check_eligible(
            message.guild_id,
            message.user_id,
            message.timestamp,
            settings.cooldown_secs,
        ) {
            return Ok(None);
        }

        let (delta, total_xp) = self
            .ledger
            .add_points(message.guild_id, message.user_id, settings.max_points)
            .await?;

        Ok(Some(Award {
            guild_id: message.guild_id,
            user_id: message.user_id,
            delta,
            total_xp,
        }))
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &Arc<ActivityTracker> {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranks::points_ledger::test_support::FixedRoll;
    use crate::core::ranks::ranks_models::SettingsDocument;
    use crate::infra::ranks::InMemoryXpStore;
    use async_trait::async_trait;

    struct NoopSettingsStore;

    #[async_trait]
    impl SettingsStore for NoopSettingsStore {
        async fn load(&self) -> Result<SettingsDocument, RanksError> {
            Ok(SettingsDocument::default())
        }

        async fn save(&self, _: &SettingsDocument) -> Result<(), RanksError> {
            Ok(())
        }
    }

    async fn make_service(
        roll: u32,
    ) -> RanksService<InMemoryXpStore, NoopSettingsStore, FixedRoll> {
        let settings = Arc::new(SettingsService::new(NoopSettingsStore).await.unwrap());
        let ledger = Arc::new(PointsLedger::with_roll(InMemoryXpStore::new(), FixedRoll(roll)));
        RanksService::new(settings, Arc::new(ActivityTracker::new()), ledger)
    }

    fn message(user_id: u64, timestamp: f64) -> InboundMessage {
        InboundMessage {
            guild_id: 1,
            user_id,
            is_bot: false,
            is_private_channel: false,
            timestamp,
        }
    }

    #[tokio::test]
    async fn cooldown_blocks_second_award() {
        let service = make_service(10).await;
        service.settings.set_cooldown(1, 5).await.unwrap();

        let award = service.process_message(&message(42, 100.0)).await.unwrap();
        assert_eq!(award.map(|a| (a.delta, a.total_xp)), Some((10, 10)));

        let award = service.process_message(&message(42, 100.0)).await.unwrap();
        assert!(award.is_none());
        assert_eq!(service.ledger.query(1, 42).await.unwrap().xp, 10);
    }

    #[tokio::test]
    async fn award_resumes_after_cooldown() {
        let service = make_service(3).await;
        service.settings.set_cooldown(1, 5).await.unwrap();

        assert!(service.process_message(&message(42, 100.0)).await.unwrap().is_some());
        assert!(service.process_message(&message(42, 105.0)).await.unwrap().is_none());
        let award = service.process_message(&message(42, 105.5)).await.unwrap();
        assert_eq!(award.map(|a| a.total_xp), Some(6));
    }

    #[tokio::test]
    async fn max_points_setting_caps_the_roll() {
        let service = make_service(25).await;
        service.settings.set_max_points(1, 4).await.unwrap();

        let award = service.process_message(&message(42, 1.0)).await.unwrap().unwrap();
        assert_eq!(award.delta, 4);
    }

    #[tokio::test]
    async fn bots_and_private_channels_are_ignored() {
        let service = make_service(10).await;

        let mut from_bot = message(42, 1.0);
        from_bot.is_bot = true;
        assert!(service.process_message(&from_bot).await.unwrap().is_none());

        let mut in_dm = message(43, 1.0);
        in_dm.is_private_channel = true;
        assert!(service.process_message(&in_dm).await.unwrap().is_none());

        // Ignored messages don't start a cooldown either.
        assert_eq!(service.tracker().len(), 0);
    }
}
