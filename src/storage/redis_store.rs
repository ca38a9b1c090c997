//! Redis-backed key-value store (`redis` feature).

use super::KeyValueStore;
use crate::error::{ProcmanError, Result};
use ::redis::{Client, Commands, Connection};

/// A [`KeyValueStore`] on a Redis server.
///
/// Every call opens its own connection: the manager is single-shot and
/// polling, so there is no long-lived session to keep.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: Client,
    url: String,
}

impl RedisStore {
    /// Create a store for `url` (e.g. `redis://127.0.0.1/`).
    pub fn open(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| ProcmanError::storage(format!("invalid redis url '{}'", url), e))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    fn connection(&self) -> Result<Connection> {
        self.client
            .get_connection()
            .map_err(|e| ProcmanError::storage(format!("failed to connect to '{}'", self.url), e))
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.connection()?
            .get::<_, Option<String>>(key)
            .map_err(|e| ProcmanError::storage(format!("GET {} failed", key), e))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.connection()?
            .set::<_, _, ()>(key, value)
            .map_err(|e| ProcmanError::storage(format!("SET {} failed", key), e))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.connection()?
            .del::<_, ()>(key)
            .map_err(|e| ProcmanError::storage(format!("DEL {} failed", key), e))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.connection()?
            .keys::<_, Vec<String>>(pattern)
            .map_err(|e| ProcmanError::storage(format!("KEYS {} failed", pattern), e))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
