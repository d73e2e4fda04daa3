//! Durable fallback storage for upstream payloads.
//!
//! When the live upstream cannot be reached, the fetch layer consults this
//! store for the last known-good payload. Entries are written exclusively by
//! the warm job and expire after seven days, bounding how stale a served
//! fallback can get.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::error::FetchError;

/// Fallback entries outlive several warm-job failures before expiring.
pub const FALLBACK_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Namespace prefix applied to every key in the store.
pub const KEY_PREFIX: &str = "bcra:";

/// Key holding the full monetary-variables listing.
pub const KEY_MONETARIAS: &str = "bcra:monetarias";

/// Key holding the time series for a single variable.
pub fn series_key(variable_id: u32) -> String {
    format!("{}details_{}", KEY_PREFIX, variable_id)
}

fn full_key(key: &str) -> String {
    if key.starts_with(KEY_PREFIX) {
        key.to_string()
    } else {
        format!("{}{}", KEY_PREFIX, key)
    }
}

/// Store of raw JSON payloads under namespaced keys.
///
/// Callers handle (de)serialization so the store stays payload-agnostic.
#[async_trait]
pub trait FallbackStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, FetchError>;
    async fn put_raw(&self, key: &str, body: &str) -> Result<(), FetchError>;
}

/// Redis-backed [`FallbackStore`].
///
/// Uses a multiplexed connection manager, so `clone` is cheap and handles
/// reconnects internally.
pub struct RedisFallback {
    conn: ConnectionManager,
}

impl RedisFallback {
    pub async fn connect(url: &str) -> Result<Self, FetchError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("connected to redis fallback store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl FallbackStore for RedisFallback {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, FetchError> {
        let mut conn = self.conn.clone();
        let body: Option<String> = redis::cmd("GET")
            .arg(full_key(key))
            .query_async(&mut conn)
            .await?;
        debug!(key, hit = body.is_some(), "fallback store read");
        Ok(body)
    }

    async fn put_raw(&self, key: &str, body: &str) -> Result<(), FetchError> {
        let mut conn = self.conn.clone();
        redis::cmd("SETEX")
            .arg(full_key(key))
            .arg(FALLBACK_TTL_SECS)
            .arg(body)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(key, bytes = body.len(), "fallback store write");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_key_adds_prefix_once() {
        assert_eq!(full_key("monetarias"), "bcra:monetarias");
        assert_eq!(full_key("bcra:monetarias"), "bcra:monetarias");
    }

    #[test]
    fn test_series_key_format() {
        assert_eq!(series_key(27), "bcra:details_27");
        assert_eq!(series_key(45), "bcra:details_45");
    }
}
