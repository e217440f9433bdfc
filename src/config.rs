// Process configuration, read once at start-up from the environment (and `.env`).
// Per-guild ranking settings are not here: they live in the settings document.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    /// Folder holding settings.json, the SQLite ledger and the cooldown snapshot.
    pub data_dir: PathBuf,
    /// Database name used when the ledger lives in MySQL.
    pub mysql_database: String,
    /// How often the cooldown map is written to disk.
    pub snapshot_interval: Duration,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN").map_err(|_| {
            anyhow::anyhow!(
                "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token."
            )
        })?;

        Self::build(discord_token, |key| env::var(key).ok())
    }

    fn build(
        discord_token: String,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let snapshot_secs = match lookup("RANKS_SNAPSHOT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("RANKS_SNAPSHOT_SECS must be a whole number of seconds"))?,
            None => 300,
        };
        if snapshot_secs == 0 {
            anyhow::bail!("RANKS_SNAPSHOT_SECS must be at least 1");
        }

        Ok(Self {
            discord_token,
            data_dir: lookup("RANKS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/ranks")),
            mysql_database: lookup("RANKS_MYSQL_DATABASE").unwrap_or_else(|| "renbot".to_string()),
            snapshot_interval: Duration::from_secs(snapshot_secs),
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn last_spoke_path(&self) -> PathBuf {
        self.data_dir.join("lastspoke.json")
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("ranks.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn build(vars: &[(&str, &str)]) -> anyhow::Result<BotConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::build("token".into(), |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = build(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data/ranks"));
        assert_eq!(config.mysql_database, "renbot");
        assert_eq!(config.snapshot_interval, Duration::from_secs(300));
        assert_eq!(config.settings_path(), PathBuf::from("data/ranks/settings.json"));
    }

    #[test]
    fn overrides_are_read() {
        let config = build(&[
            ("RANKS_DATA_DIR", "/var/lib/ranks"),
            ("RANKS_MYSQL_DATABASE", "community"),
            ("RANKS_SNAPSHOT_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.sqlite_path(), PathBuf::from("/var/lib/ranks/ranks.db"));
        assert_eq!(config.mysql_database, "community");
        assert_eq!(config.snapshot_interval, Duration::from_secs(60));
    }

    #[test]
    fn bad_snapshot_interval_is_rejected() {
        assert!(build(&[("RANKS_SNAPSHOT_SECS", "soon")]).is_err());
        assert!(build(&[("RANKS_SNAPSHOT_SECS", "0")]).is_err());
    }
}
