use crate::core::ranks::{RanksError, Standing, XpRecord, XpStore};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on waiting for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default durable ledger: one SQLite file next to the settings.
pub struct SqliteXpStore {
    pool: Pool<Sqlite>,
}

impl SqliteXpStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Make sure the folder exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !in_memory {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };
        let options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);

        // Every connection to :memory: is its own database, so keep exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS xp (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                xp INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, guild_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_xp_guild_order ON xp (guild_id, xp DESC, user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl XpStore for SqliteXpStore {
    async fn add_xp(&self, guild_id: u64, user_id: u64, delta: u64) -> Result<u64, RanksError> {
        // One statement, so SQLite's write lock covers the read and the write.
        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO xp (user_id, guild_id, xp)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, guild_id) DO UPDATE SET
            xp = xp + excluded.xp
            RETURNING xp
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(delta as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(RanksError::backend)?;

        Ok(total as u64)
    }

    async fn standing(&self, guild_id: u64, user_id: u64) -> Result<Option<Standing>, RanksError> {
        let row = sqlx::query(
            r#"
            SELECT me.xp AS xp,
                   (SELECT COUNT(*) FROM xp other
                     WHERE other.guild_id = me.guild_id
                       AND (other.xp > me.xp
                            OR (other.xp = me.xp AND other.user_id < me.user_id))) + 1 AS member_rank
            FROM xp me
            WHERE me.guild_id = ? AND me.user_id = ?
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(RanksError::backend)?;

        Ok(row.map(|row| Standing {
            rank: row.get::<i64, _>("member_rank") as u64,
            xp: row.get::<i64, _>("xp") as u64,
        }))
    }

    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<XpRecord>, RanksError> {
        // IDs are stored as i64. Discord snowflakes stay below 2^63, so the
        // signed user_id order matches the u64 order of the other stores.
        let rows = sqlx::query(
            "SELECT user_id, xp FROM xp WHERE guild_id = ? ORDER BY xp DESC, user_id ASC LIMIT ?",
        )
        .bind(guild_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(RanksError::backend)?;

        Ok(rows
            .iter()
            .map(|row| XpRecord {
                user_id: row.get::<i64, _>("user_id") as u64,
                guild_id,
                xp: row.get::<i64, _>("xp") as u64,
            })
            .collect())
    }
}
