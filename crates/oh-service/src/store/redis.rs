//! Redis-backed [`StateStore`] implementation.
//!
//! Uses a [`ConnectionManager`] so a dropped connection is re-established
//! transparently between commands. Every operation records latency and
//! outcome metrics under a bounded `op` label (one value per store verb).

use super::{StateStore, StoreError};
use crate::observability::metrics;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Instant;
use tracing::instrument;

/// Redis client implementing the store capability contract.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis and start the connection manager.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the URL is invalid or the initial
    /// connection cannot be established.
    #[instrument(skip_all, name = "oh.store.connect")]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Io(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(Self { manager })
    }

    /// Wrap an existing connection manager (used by integration harnesses).
    #[must_use]
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn finish<T>(
        op: &'static str,
        start: Instant,
        res: redis::RedisResult<T>,
    ) -> Result<T, StoreError> {
        match res {
            Ok(value) => {
                metrics::record_store_op(op, "success", start.elapsed());
                Ok(value)
            }
            Err(e) => {
                metrics::record_store_op(op, "error", start.elapsed());
                Err(StoreError::Io(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<HashMap<String, String>> = conn.hgetall(key).await;
        Self::finish("hgetall", start, res)
    }

    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.hset_multiple(key, fields).await;
        Self::finish("hset", start, res)
    }

    async fn hash_delete_fields(&self, key: &str, fields: &[&str]) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.hdel(key, fields.to_vec()).await;
        Self::finish("hdel", start, res)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<Option<String>> = conn.get(key).await;
        Self::finish("get", start, res)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.set(key, value).await;
        Self::finish("set", start, res)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.del(key).await;
        Self::finish("del", start, res)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.sadd(key, member).await;
        Self::finish("sadd", start, res)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.srem(key, member).await;
        Self::finish("srem", start, res)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<Vec<String>> = conn.smembers(key).await;
        Self::finish("smembers", start, res)
    }

    async fn zset_add(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.zadd(key, member, score).await;
        Self::finish("zadd", start, res)
    }

    async fn zset_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<()> = conn.zrem(key, member).await;
        Self::finish("zrem", start, res)
    }

    async fn zset_range(
        &self,
        key: &str,
        start_rank: isize,
        stop_rank: isize,
    ) -> Result<Vec<String>, StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<Vec<String>> = conn.zrange(key, start_rank, stop_rank).await;
        Self::finish("zrange", start, res)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let start = Instant::now();
        let mut conn = self.manager.clone();
        let res: redis::RedisResult<String> =
            redis::cmd("PING").query_async(&mut conn).await;
        let reply = Self::finish("ping", start, res)?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(StoreError::UnexpectedReply(reply))
        }
    }
}
