use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::redis::{cmd, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::{page_bounds, range_bounds, RedisResultExt};
use crate::redis::codec::{from_json_all, to_json};
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 列表操作，元素以 JSON 儲存
#[async_trait]
pub trait ListOperations: Send + Sync + 'static {
    /// 添加項到指定鍵的列表末尾
    async fn list_add<K, V>(&self, key: K, value: &V) -> RedisManagerResult<()>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 將多個項依序添加到列表末尾，空切片不做任何事
    async fn list_add_range<K, V>(&self, key: K, values: &[V]) -> RedisManagerResult<()>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 移除列表中所有等於 `value` 的項
    async fn list_remove<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 移除整個列表
    async fn list_remove_all<K>(&self, key: K) -> RedisManagerResult<()>
    where
        K: AsRef<str> + Send + Sync;

    /// 列表中的元素數
    async fn list_count<K>(&self, key: K) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync;

    /// 從 `index` 開始取 `count` 個元素
    async fn list_get_range<K, V>(
        &self,
        key: K,
        index: usize,
        count: usize,
    ) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 獲取列表中的所有元素
    async fn list_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 分頁獲取，`page_index` 從 1 開始
    async fn list_get_page<K, V>(
        &self,
        key: K,
        page_index: usize,
        page_size: usize,
    ) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 設置列表在指定時間點過期
    async fn list_set_expire<K>(&self, key: K, at: DateTime<Utc>) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;
}

impl<P: RedisPool> RedisManager<P> {
    async fn list_range<V: DeserializeOwned + Send>(
        &self,
        key: String,
        start: isize,
        stop: isize,
    ) -> RedisManagerResult<Vec<V>> {
        let mut conn = self.pool.get_read_conn().await?;
        let raws: Vec<String> = conn.lrange(&key, start, stop).await.logged("LRANGE", &key)?;
        debug!("列表讀取 {} [{}..{}]: {} 項", key, start, stop, raws.len());
        from_json_all(raws)
    }
}

#[async_trait]
impl<P: RedisPool> ListOperations for RedisManager<P> {
    async fn list_add<K, V>(&self, key: K, value: &V) -> RedisManagerResult<()>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let serialized = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let len: usize = conn.rpush(&key, serialized).await.logged("RPUSH", &key)?;
        debug!("列表添加成功 {}，目前長度 {}", key, len);
        Ok(())
    }

    async fn list_add_range<K, V>(&self, key: K, values: &[V]) -> RedisManagerResult<()>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        if values.is_empty() {
            return Ok(());
        }

        let serialized = values.iter().map(to_json).collect::<RedisManagerResult<Vec<_>>>()?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let len: usize = conn.rpush(&key, serialized).await.logged("RPUSH", &key)?;
        debug!("列表批量添加 {} 項到 {}，目前長度 {}", values.len(), key, len);
        Ok(())
    }

    async fn list_remove<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let serialized = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = cmd("LREM")
            .arg(&key)
            .arg(0)
            .arg(serialized)
            .query_async(&mut conn)
            .await
            .logged("LREM", &key)?;
        Ok(removed > 0)
    }

    async fn list_remove_all<K>(&self, key: K) -> RedisManagerResult<()>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let _: i64 = conn.del(&key).await.logged("DEL", &key)?;
        debug!("列表已清空: {}", key);
        Ok(())
    }

    async fn list_count<K>(&self, key: K) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.llen(&key).await.logged("LLEN", &key)
    }

    async fn list_get_range<K, V>(
        &self,
        key: K,
        index: usize,
        count: usize,
    ) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        match range_bounds(index, count) {
            Some((start, stop)) => self.list_range(self.prefix_key(key), start, stop).await,
            None => Ok(Vec::new()),
        }
    }

    async fn list_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        self.list_range(self.prefix_key(key), 0, -1).await
    }

    async fn list_get_page<K, V>(
        &self,
        key: K,
        page_index: usize,
        page_size: usize,
    ) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        match page_bounds(page_index, page_size) {
            Some((start, stop)) => self.list_range(self.prefix_key(key), start, stop).await,
            None => Ok(Vec::new()),
        }
    }

    async fn list_set_expire<K>(&self, key: K, at: DateTime<Utc>) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let set: bool = cmd("EXPIREAT")
            .arg(&key)
            .arg(at.timestamp())
            .query_async(&mut conn)
            .await
            .logged("EXPIREAT", &key)?;
        debug!("列表過期時間設置 {}: {} ({})", key, if set { "成功" } else { "鍵不存在" }, at);
        Ok(set)
    }
}
