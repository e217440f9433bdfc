// Per-community ranking settings plus the backend credentials.
//
// The whole document is cached in memory and written through to the store on
// every change. Changes are rare (admin commands), so no batching.

use super::ranks_errors::RanksError;
use super::ranks_models::{BackendCredentials, CommunitySettings, SettingsDocument};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Loads and saves the settings document as a whole.
///
/// `save` must replace the document atomically: a reader may see the old
/// document or the new one, never half of each.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<SettingsDocument, RanksError>;
    async fn save(&self, document: &SettingsDocument) -> Result<(), RanksError>;
}

pub struct SettingsService<S: SettingsStore> {
    store: S,
    document: RwLock<SettingsDocument>,
}

impl<S: SettingsStore> SettingsService<S> {
    /// Load the document once. Later changes on disk are only picked up by `reload`.
    pub async fn new(store: S) -> Result<Self, RanksError> {
        let document = store.load().await?;
        Ok(Self {
            store,
            document: RwLock::new(document),
        })
    }

    /// Settings for a guild, falling back to defaults when it was never configured.
    pub async fn get(&self, guild_id: u64) -> CommunitySettings {
        self.configured(guild_id)
            .await
            .unwrap_or_else(|| CommunitySettings::defaults_for(guild_id))
    }

    /// Settings for a guild only if an admin has configured it.
    pub async fn configured(&self, guild_id: u64) -> Option<CommunitySettings> {
        self.document.read().await.communities.get(&guild_id).copied()
    }

    pub async fn set_cooldown(&self, guild_id: u64, seconds: i64) -> Result<CommunitySettings, RanksError> {
        let seconds = u64::try_from(seconds).map_err(|_| {
            RanksError::InvalidArgument(format!("cooldown must be 0 or more seconds, got {seconds}"))
        })?;
        self.update(guild_id, |settings| settings.cooldown_secs = seconds)
            .await
    }

    pub async fn set_max_points(&self, guild_id: u64, points: i64) -> Result<CommunitySettings, RanksError> {
        let points = u32::try_from(points).map_err(|_| {
            RanksError::InvalidArgument(format!(
                "max points must be between 0 and {}, got {points}",
                u32::MAX
            ))
        })?;
        self.update(guild_id, |settings| settings.max_points = points)
            .await
    }

    /// Overwrite the guild's settings with the defaults.
    pub async fn reset_to_defaults(&self, guild_id: u64) -> Result<CommunitySettings, RanksError> {
        self.update(guild_id, |settings| {
            *settings = CommunitySettings::defaults_for(guild_id)
        })
        .await
    }

    pub async fn credentials(&self) -> Option<BackendCredentials> {
        self.document.read().await.credentials.clone()
    }

    pub async fn set_credentials(&self, credentials: BackendCredentials) -> Result<(), RanksError> {
        let mut document = self.document.write().await;
        let mut next = document.clone();
        next.credentials = Some(credentials);
        self.store.save(&next).await?;
        *document = next;
        Ok(())
    }

    /// Replace the cached document with what is currently persisted.
    pub async fn reload(&self) -> Result<(), RanksError> {
        let fresh = self.store.load().await?;
        *self.document.write().await = fresh;
        Ok(())
    }

    // The cache only changes after the store accepted the new document, so a
    // failed save leaves the previous settings in place.
    async fn update(
        &self,
        guild_id: u64,
        apply: impl FnOnce(&mut CommunitySettings),
    ) -> Result<CommunitySettings, RanksError> {
        let mut document = self.document.write().await;
        let mut next = document.clone();
        let settings = next
            .communities
            .entry(guild_id)
            .or_insert_with(|| CommunitySettings::defaults_for(guild_id));
        apply(settings);
        let updated = *settings;

        self.store.save(&next).await?;
        *document = next;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranks::ranks_models::{DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_POINTS};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<SettingsDocument>,
        saves: AtomicUsize,
        fail_saves: AtomicBool,
    }

    #[async_trait]
    impl SettingsStore for MemoryStore {
        async fn load(&self) -> Result<SettingsDocument, RanksError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn save(&self, document: &SettingsDocument) -> Result<(), RanksError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(RanksError::backend("disk full"));
            }
            *self.saved.lock().unwrap() = document.clone();
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn make_service() -> SettingsService<MemoryStore> {
        SettingsService::new(MemoryStore::default()).await.unwrap()
    }

    #[tokio::test]
    async fn unconfigured_guild_gets_defaults() {
        let service = make_service().await;
        let settings = service.get(1).await;
        assert_eq!(settings.cooldown_secs, DEFAULT_COOLDOWN_SECS);
        assert_eq!(settings.max_points, DEFAULT_MAX_POINTS);
        assert!(service.configured(1).await.is_none());
    }

    #[tokio::test]
    async fn mutations_are_written_through() {
        let service = make_service().await;
        service.set_cooldown(1, 30).await.unwrap();
        service.set_max_points(1, 40).await.unwrap();

        assert_eq!(service.store.saves.load(Ordering::SeqCst), 2);
        let saved = service.store.saved.lock().unwrap().clone();
        let settings = saved.communities[&1];
        assert_eq!(settings.cooldown_secs, 30);
        assert_eq!(settings.max_points, 40);
    }

    #[tokio::test]
    async fn negative_values_are_rejected_without_changes() {
        let service = make_service().await;
        service.set_cooldown(1, 10).await.unwrap();
        service.set_max_points(1, 15).await.unwrap();

        let err = service.set_cooldown(1, -1).await.unwrap_err();
        assert!(matches!(err, RanksError::InvalidArgument(_)));
        let err = service.set_max_points(1, -1).await.unwrap_err();
        assert!(matches!(err, RanksError::InvalidArgument(_)));

        let settings = service.get(1).await;
        assert_eq!(settings.cooldown_secs, 10);
        assert_eq!(settings.max_points, 15);
        assert_eq!(service.store.saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_settings() {
        let service = make_service().await;
        service.set_cooldown(1, 10).await.unwrap();
        service.store.fail_saves.store(true, Ordering::SeqCst);

        assert!(service.set_cooldown(1, 99).await.is_err());
        assert_eq!(service.get(1).await.cooldown_secs, 10);
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let service = make_service().await;
        service.set_cooldown(1, 10).await.unwrap();
        service.set_max_points(1, 3).await.unwrap();

        let settings = service.reset_to_defaults(1).await.unwrap();
        assert_eq!(settings, CommunitySettings::defaults_for(1));
        assert_eq!(service.configured(1).await, Some(settings));
    }

    #[tokio::test]
    async fn credentials_and_reload() {
        let service = make_service().await;
        let credentials = BackendCredentials {
            host: "db.local".into(),
            username: "ranks".into(),
            password: "hunter2".into(),
        };
        service.set_credentials(credentials.clone()).await.unwrap();
        assert_eq!(service.credentials().await, Some(credentials));

        // Someone edits the file by hand; reload picks it up.
        service
            .store
            .saved
            .lock()
            .unwrap()
            .communities
            .insert(5, CommunitySettings {
                guild_id: 5,
                cooldown_secs: 7,
                max_points: 8,
            });
        assert!(service.configured(5).await.is_none());
        service.reload().await.unwrap();
        assert_eq!(service.get(5).await.cooldown_secs, 7);
    }
}
