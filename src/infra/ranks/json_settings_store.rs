use crate::core::ranks::{RanksError, SettingsDocument, SettingsStore};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Settings document stored as one JSON file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-write leaves the previous document intact.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Result<SettingsDocument, RanksError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No ranks settings file yet, using defaults");
            return Ok(SettingsDocument::default());
        }

        let file = File::open(&self.path).map_err(RanksError::backend)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RanksError::BackendUnavailable(format!(
                "settings file {} is not valid: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, document: &SettingsDocument) -> Result<(), RanksError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(RanksError::backend)?;
        }

        let temp = self.temp_path();
        {
            let file = File::create(&temp).map_err(RanksError::backend)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document).map_err(RanksError::backend)?;
            writer.flush().map_err(RanksError::backend)?;
            writer
                .get_ref()
                .sync_all()
                .map_err(RanksError::backend)?;
        }
        std::fs::rename(&temp, &self.path).map_err(RanksError::backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranks::{BackendCredentials, CommunitySettings};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().await.unwrap(), SettingsDocument::default());
    }

    #[tokio::test]
    async fn test_json_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ranks").join("settings.json");

        let mut document = SettingsDocument::default();
        document.communities.insert(
            7,
            CommunitySettings {
                guild_id: 7,
                cooldown_secs: 60,
                max_points: 10,
            },
        );
        document.credentials = Some(BackendCredentials {
            host: "localhost".into(),
            username: "bot".into(),
            password: "pw".into(),
        });

        JsonSettingsStore::new(path.clone()).save(&document).await.unwrap();

        let reloaded = JsonSettingsStore::new(path.clone()).load().await.unwrap();
        assert_eq!(reloaded, document);
        assert!(!dir.path().join("ranks").join("settings.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_not_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonSettingsStore::new(path.clone()).load().await.unwrap_err();
        assert!(matches!(err, RanksError::BackendUnavailable(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
