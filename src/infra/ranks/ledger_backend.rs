// Picks the XP ledger at start-up: MySQL when credentials are configured,
// otherwise the local SQLite file.

use super::mysql_store::MySqlXpStore;
use super::sqlite_store::SqliteXpStore;
use crate::core::ranks::{BackendCredentials, RanksError, Standing, XpRecord, XpStore};
use async_trait::async_trait;

pub enum LedgerBackend {
    Sqlite(SqliteXpStore),
    MySql(MySqlXpStore),
}

impl LedgerBackend {
    pub async fn connect(
        credentials: Option<&BackendCredentials>,
        sqlite_path: &str,
        mysql_database: &str,
    ) -> anyhow::Result<Self> {
        match credentials {
            Some(credentials) => {
                tracing::info!(
                    host = %credentials.host,
                    user = %credentials.username,
                    database = mysql_database,
                    "Connecting XP ledger to MySQL"
                );
                Ok(Self::MySql(
                    MySqlXpStore::connect(credentials, mysql_database).await?,
                ))
            }
            None => {
                tracing::info!(path = sqlite_path, "Using local SQLite XP ledger");
                Ok(Self::Sqlite(SqliteXpStore::new(sqlite_path).await?))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLite",
            Self::MySql(_) => "MySQL",
        }
    }
}

#[async_trait]
impl XpStore for LedgerBackend {
    async fn add_xp(&self, guild_id: u64, user_id: u64, delta: u64) -> Result<u64, RanksError> {
        match self {
            Self::Sqlite(store) => store.add_xp(guild_id, user_id, delta).await,
            Self::MySql(store) => store.add_xp(guild_id, user_id, delta).await,
        }
    }

    async fn standing(&self, guild_id: u64, user_id: u64) -> Result<Option<Standing>, RanksError> {
        match self {
            Self::Sqlite(store) => store.standing(guild_id, user_id).await,
            Self::MySql(store) => store.standing(guild_id, user_id).await,
        }
    }

    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<XpRecord>, RanksError> {
        match self {
            Self::Sqlite(store) => store.top(guild_id, limit).await,
            Self::MySql(store) => store.top(guild_id, limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn without_credentials_uses_sqlite() {
        let backend = LedgerBackend::connect(None, "sqlite::memory:", "renbot")
            .await
            .unwrap();
        assert_eq!(backend.name(), "SQLite");
        assert_eq!(backend.add_xp(1, 2, 3).await.unwrap(), 3);
        assert_eq!(backend.top(1, 5).await.unwrap().len(), 1);
    }
}
