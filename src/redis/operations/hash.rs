use async_trait::async_trait;
use deadpool_redis::redis::{cmd, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ttl_millis, RedisResultExt};
use crate::redis::codec::{from_json, from_json_all, to_json};
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 哈希表操作，欄位值以 JSON 儲存
#[async_trait]
pub trait HashOperations: Send + Sync + 'static {
    /// 確定欄位是否在哈希表中
    async fn hash_contains<K, F>(&self, key: K, field: F) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync;

    /// 設置欄位值，新建欄位時返回 true，覆寫既有欄位時返回 false
    async fn hash_set<K, F, V>(&self, key: K, field: F, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 移除欄位
    async fn hash_remove<K, F>(&self, key: K, field: F) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync;

    /// 移除整個哈希表
    async fn hash_remove_all<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;

    /// 獲取欄位值
    async fn hash_get<K, F, V>(&self, key: K, field: F) -> RedisManagerResult<Option<V>>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 獲取哈希表的所有欄位值
    async fn hash_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 設置哈希表的有效期
    async fn hash_set_expire<K>(&self, key: K, ttl: Duration) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;
}

#[async_trait]
impl<P: RedisPool> HashOperations for RedisManager<P> {
    async fn hash_contains<K, F>(&self, key: K, field: F) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.hexists(&key, field.as_ref()).await.logged("HEXISTS", &key)
    }

    async fn hash_set<K, F, V>(&self, key: K, field: F, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let serialized = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let created: i64 = conn
            .hset(&key, field.as_ref(), serialized)
            .await
            .logged("HSET", &key)?;
        debug!(
            "哈希欄位設置 {}.{}: {}",
            key,
            field.as_ref(),
            if created > 0 { "新建" } else { "覆寫" }
        );
        Ok(created > 0)
    }

    async fn hash_remove<K, F>(&self, key: K, field: F) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = conn.hdel(&key, field.as_ref()).await.logged("HDEL", &key)?;
        Ok(removed > 0)
    }

    async fn hash_remove_all<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = conn.del(&key).await.logged("DEL", &key)?;
        Ok(removed > 0)
    }

    async fn hash_get<K, F, V>(&self, key: K, field: F) -> RedisManagerResult<Option<V>>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        let raw: Option<String> = conn.hget(&key, field.as_ref()).await.logged("HGET", &key)?;
        raw.map(|raw| from_json(&raw)).transpose()
    }

    async fn hash_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        let raws: Vec<String> = conn.hvals(&key).await.logged("HVALS", &key)?;
        from_json_all(raws)
    }

    async fn hash_set_expire<K>(&self, key: K, ttl: Duration) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let millis = ttl_millis(ttl)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let set: bool = cmd("PEXPIRE")
            .arg(&key)
            .arg(millis)
            .query_async(&mut conn)
            .await
            .logged("PEXPIRE", &key)?;
        debug!(
            "哈希表有效期設置 {}: {} ({}ms)",
            key,
            if set { "成功" } else { "鍵不存在" },
            millis
        );
        Ok(set)
    }
}
