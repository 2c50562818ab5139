use async_trait::async_trait;
use deadpool_redis::redis::{cmd, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ttl_millis, RedisResultExt};
use crate::redis::codec::{from_json, to_json};
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 單一鍵值項目操作，值以 JSON 儲存
#[async_trait]
pub trait ItemOperations: Send + Sync + 'static {
    /// 設置指定的項到指定的鍵中
    async fn item_set<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 設置指定的項，並在 `ttl` 後過期
    async fn item_set_expire<K, V>(
        &self,
        key: K,
        value: &V,
        ttl: Duration,
    ) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 獲取指定的鍵的項，不存在時返回 None
    async fn item_get<K, V>(&self, key: K) -> RedisManagerResult<Option<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 移除指定的鍵的項
    async fn item_remove<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;
}

#[async_trait]
impl<P: RedisPool> ItemOperations for RedisManager<P> {
    async fn item_set<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let serialized = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        conn.set::<_, _, ()>(&key, serialized).await.logged("SET", &key)?;

        debug!("項目設置成功: {}", key);
        Ok(true)
    }

    async fn item_set_expire<K, V>(
        &self,
        key: K,
        value: &V,
        ttl: Duration,
    ) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let millis = ttl_millis(ttl)?;
        let serialized = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        cmd("SET")
            .arg(&key)
            .arg(serialized)
            .arg("PX")
            .arg(millis)
            .query_async::<()>(&mut conn)
            .await
            .logged("SET PX", &key)?;

        debug!("項目設置成功 (有效期 {}ms): {}", millis, key);
        Ok(true)
    }

    async fn item_get<K, V>(&self, key: K) -> RedisManagerResult<Option<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        match conn.get::<_, Option<String>>(&key).await.logged("GET", &key)? {
            Some(raw) => {
                debug!("項目命中: {}", key);
                from_json(&raw).map(Some)
            }
            None => {
                debug!("項目不存在: {}", key);
                Ok(None)
            }
        }
    }

    async fn item_remove<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = conn.del(&key).await.logged("DEL", &key)?;
        debug!("項目刪除 {}: {}", key, if removed > 0 { "成功" } else { "鍵不存在" });
        Ok(removed > 0)
    }
}
