//! Redis Store Backend
//!
//! Production [`KeyValueStore`] adapter over a Redis instance. Pattern
//! enumeration uses cursored SCAN rather than KEYS so large keyspaces do
//! not block the server, and `info()` parses the live INFO sections the
//! alert manager samples.

use std::time::Duration;

use redis::AsyncCommands;
use tracing::info;

use super::{KeyValueStore, StoreInfo};
use crate::error::Result;

/// Redis-backed key/value store.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Connect to Redis at `url` and verify the connection with a PING.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("connected to redis at {}", url);
        Ok(Self { client })
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        let deleted: i64 = conn.del(keys.to_vec()).await?;
        Ok(deleted as u64)
    }

    async fn sadd(&self, set_key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.sadd::<_, _, ()>(set_key, member).await?;
        Ok(())
    }

    async fn smembers(&self, set_key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let members: Vec<String> = conn.smembers(set_key).await?;
        Ok(members)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.expire::<_, ()>(key, ttl.as_secs() as i64).await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut matched = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            matched.extend(keys);
            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(matched)
    }

    async fn lpush_trim(&self, list_key: &str, value: &str, max_len: usize) -> Result<()> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.lpush(list_key, value)
            .ltrim(list_key, 0, max_len as isize - 1);
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let mut conn = self.conn().await?;

        let raw: String = redis::cmd("INFO").query_async(&mut conn).await?;
        let keys: u64 = redis::cmd("DBSIZE").query_async(&mut conn).await?;

        let mut store_info = parse_info(&raw);
        store_info.keys = keys;
        Ok(store_info)
    }
}

/// Parse the INFO fields the alert manager cares about.
///
/// Hit rate is derived from `keyspace_hits`/`keyspace_misses`; a server
/// with no recorded lookups reports 0.0 rather than dividing by zero.
fn parse_info(raw: &str) -> StoreInfo {
    let mut hits: u64 = 0;
    let mut misses: u64 = 0;
    let mut used_memory: u64 = 0;
    let mut connected_clients: u64 = 0;

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name {
            "keyspace_hits" => hits = value.parse().unwrap_or(0),
            "keyspace_misses" => misses = value.parse().unwrap_or(0),
            "used_memory" => used_memory = value.parse().unwrap_or(0),
            "connected_clients" => connected_clients = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    let total = hits + misses;
    let hit_rate = if total > 0 {
        hits as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    StoreInfo {
        hit_rate,
        used_memory_mb: used_memory as f64 / (1024.0 * 1024.0),
        connected_clients,
        keys: 0,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_INFO: &str = "# Clients\r\nconnected_clients:12\r\n\
        # Memory\r\nused_memory:52428800\r\nused_memory_human:50.00M\r\n\
        # Stats\r\nkeyspace_hits:900\r\nkeyspace_misses:100\r\n";

    #[test]
    fn test_parse_info_fields() {
        let info = parse_info(SAMPLE_INFO);

        assert_eq!(info.connected_clients, 12);
        assert!((info.used_memory_mb - 50.0).abs() < f64::EPSILON);
        assert!((info.hit_rate - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_info_no_lookups() {
        let info = parse_info("keyspace_hits:0\r\nkeyspace_misses:0\r\n");
        assert_eq!(info.hit_rate, 0.0);
    }

    #[test]
    fn test_parse_info_ignores_unknown_lines() {
        let info = parse_info("# Server\r\nredis_version:7.2.0\r\nuptime_in_seconds:55\r\n");
        assert_eq!(info, StoreInfo::default());
    }
}
