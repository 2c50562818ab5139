use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::RedisResultExt;
use crate::redis::codec::{from_json_all, to_json};
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 無序集合操作
#[async_trait]
pub trait SetOperations: Send + Sync + 'static {
    /// 加入元素，已存在時忽略並返回 false
    async fn set_add<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 集合中的元素數
    async fn set_count<K>(&self, key: K) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync;

    /// 確定元素是否在集合中
    async fn set_contains<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 移除元素
    async fn set_remove<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 獲取集合中的所有元素，順序不固定
    async fn set_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;
}

#[async_trait]
impl<P: RedisPool> SetOperations for RedisManager<P> {
    async fn set_add<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let member = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let added: i64 = conn.sadd(&key, member).await.logged("SADD", &key)?;
        debug!("集合添加 {}: {}", key, if added > 0 { "新元素" } else { "已存在" });
        Ok(added > 0)
    }

    async fn set_count<K>(&self, key: K) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.scard(&key).await.logged("SCARD", &key)
    }

    async fn set_contains<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let member = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.sismember(&key, member).await.logged("SISMEMBER", &key)
    }

    async fn set_remove<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let member = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = conn.srem(&key, member).await.logged("SREM", &key)?;
        Ok(removed > 0)
    }

    async fn set_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        let members: Vec<String> = conn.smembers(&key).await.logged("SMEMBERS", &key)?;
        from_json_all(members)
    }
}
