// MySQL ledger, used when backend credentials have been configured.
// The table layout matches the historical `xp (userid, guildid, xp)` schema
// so an existing database can be pointed at directly.

use crate::core::ranks::{BackendCredentials, RanksError, Standing, XpRecord, XpStore};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, Pool, Row};
use std::time::Duration;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PORT: u16 = 3306;

pub struct MySqlXpStore {
    pool: Pool<MySql>,
}

impl MySqlXpStore {
    pub async fn connect(credentials: &BackendCredentials, database: &str) -> anyhow::Result<Self> {
        let (host, port) = split_host_port(&credentials.host)?;
        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&credentials.username)
            .password(&credentials.password)
            .database(database);

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
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
                userid BIGINT UNSIGNED NOT NULL,
                guildid BIGINT UNSIGNED NOT NULL,
                xp BIGINT UNSIGNED NOT NULL DEFAULT 0,
                PRIMARY KEY (userid, guildid),
                KEY idx_xp_guild_order (guildid, xp)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// `"db.example.org:3307"` -> `("db.example.org", 3307)`; no port means 3306.
///
/// IPv6 addresses take a port only in brackets (`"[::1]:3307"`). A bare
/// address like `"::1"` is a host with the default port.
fn split_host_port(host: &str) -> anyhow::Result<(&str, u16)> {
    let parse_port = |port: &str| -> anyhow::Result<u16> {
        port.parse()
            .map_err(|_| anyhow::anyhow!("invalid port in database host '{host}'"))
    };

    if let Some(rest) = host.strip_prefix('[') {
        let (name, tail) = rest
            .split_once(']')
            .ok_or_else(|| anyhow::anyhow!("unclosed '[' in database host '{host}'"))?;
        return match tail.strip_prefix(':') {
            Some(port) => Ok((name, parse_port(port)?)),
            None if tail.is_empty() => Ok((name, DEFAULT_PORT)),
            None => Err(anyhow::anyhow!("unexpected text after ']' in database host '{host}'")),
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && !name.contains(':') => {
            Ok((name, parse_port(port)?))
        }
        _ => Ok((host, DEFAULT_PORT)),
    }
}

#[async_trait]
impl XpStore for MySqlXpStore {
    async fn add_xp(&self, guild_id: u64, user_id: u64, delta: u64) -> Result<u64, RanksError> {
        // The upsert takes the row lock, which is held until commit, so the
        // read-back sees exactly our own write.
        let mut tx = self.pool.begin().await.map_err(RanksError::backend)?;

        sqlx::query(
            "INSERT INTO xp (userid, guildid, xp) VALUES (?, ?, ?) \
             ON DUPLICATE KEY UPDATE xp = xp + VALUES(xp)",
        )
        .bind(user_id)
        .bind(guild_id)
        .bind(delta)
        .execute(&mut *tx)
        .await
        .map_err(RanksError::backend)?;

        let total: u64 = sqlx::query_scalar("SELECT xp FROM xp WHERE userid = ? AND guildid = ?")
            .bind(user_id)
            .bind(guild_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(RanksError::backend)?;

        tx.commit().await.map_err(RanksError::backend)?;
        Ok(total)
    }

    async fn standing(&self, guild_id: u64, user_id: u64) -> Result<Option<Standing>, RanksError> {
        let row = sqlx::query(
            r#"
            SELECT me.xp AS xp,
                   CAST((SELECT COUNT(*) FROM xp other
                          WHERE other.guildid = me.guildid
                            AND (other.xp > me.xp
                                 OR (other.xp = me.xp AND other.userid < me.userid))) + 1
                        AS SIGNED) AS member_rank
            FROM xp me
            WHERE me.guildid = ? AND me.userid = ?
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RanksError::backend)?;

        Ok(row.map(|row| Standing {
            rank: row.get::<i64, _>("member_rank") as u64,
            xp: row.get::<u64, _>("xp"),
        }))
    }

    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<XpRecord>, RanksError> {
        let rows = sqlx::query(
            "SELECT userid, xp FROM xp WHERE guildid = ? ORDER BY xp DESC, userid ASC LIMIT ?",
        )
        .bind(guild_id)
        .bind(limit as u64)
        .fetch_all(&self.pool)
        .await
        .map_err(RanksError::backend)?;

        Ok(rows
            .iter()
            .map(|row| XpRecord {
                user_id: row.get::<u64, _>("userid"),
                guild_id,
                xp: row.get::<u64, _>("xp"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_without_port_uses_default() {
        assert_eq!(split_host_port("db.local").unwrap(), ("db.local", 3306));
    }

    #[test]
    fn host_with_port_is_split() {
        assert_eq!(split_host_port("db.local:3307").unwrap(), ("db.local", 3307));
        assert!(split_host_port("db.local:abc").is_err());
    }

    #[test]
    fn bare_ipv6_host_keeps_every_colon() {
        assert_eq!(split_host_port("::1").unwrap(), ("::1", 3306));
        assert_eq!(split_host_port("fe80::2:1").unwrap(), ("fe80::2:1", 3306));
    }

    #[test]
    fn bracketed_ipv6_host_may_carry_a_port() {
        assert_eq!(split_host_port("[::1]:3307").unwrap(), ("::1", 3307));
        assert_eq!(split_host_port("[::1]").unwrap(), ("::1", 3306));
        assert!(split_host_port("[::1").is_err());
        assert!(split_host_port("[::1]x").is_err());
    }
}
