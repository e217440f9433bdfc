// Optional durable backing for the cooldown map.
// Losing this file only means members are eligible again right after a restart.

use crate::core::ranks::LastSpokeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct LastSpokeSnapshot {
    saved_at: DateTime<Utc>,
    records: Vec<LastSpokeRecord>,
}

pub struct LastSpokeFile {
    path: PathBuf,
}

impl LastSpokeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Records from the last snapshot. A missing or unreadable file is an empty snapshot.
    pub fn load(&self) -> Vec<LastSpokeRecord> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        match serde_json::from_str::<LastSpokeSnapshot>(&contents) {
            Ok(snapshot) => {
                tracing::info!(
                    records = snapshot.records.len(),
                    saved_at = %snapshot.saved_at,
                    "Restored cooldown snapshot"
                );
                snapshot.records
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable cooldown snapshot {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, records: Vec<LastSpokeRecord>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = LastSpokeSnapshot {
            saved_at: Utc::now(),
            records,
        };

        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp = self.path.with_file_name(temp_name);

        std::fs::write(&temp, serde_json::to_vec(&snapshot)?)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
