use async_trait::async_trait;
use deadpool_redis::redis::{cmd, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{page_bounds, ttl_millis, RedisResultExt};
use crate::redis::codec::{from_json_all, to_json};
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 以成員前四個位元組（大端序）計算的評分，讓未指定評分的成員大致依字典序排列
pub fn lexical_score(member: &str) -> f64 {
    let mut prefix = [0u8; 4];
    for (slot, byte) in prefix.iter_mut().zip(member.bytes()) {
        *slot = byte;
    }
    f64::from(u32::from_be_bytes(prefix))
}

/// 有序集合操作，成員以 JSON 儲存
#[async_trait]
pub trait SortedSetOperations: Send + Sync + 'static {
    /// 以字典序評分加入成員
    async fn sorted_set_add<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 以指定評分加入成員，已存在時更新評分並返回 false
    async fn sorted_set_add_with_score<K, V>(
        &self,
        key: K,
        value: &V,
        score: f64,
    ) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 移除成員
    async fn sorted_set_remove<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 只保留排名最前的 `size` 個成員，返回移除的數量
    async fn sorted_set_trim<K>(&self, key: K, size: usize) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync;

    /// 有序集合中的成員數
    async fn sorted_set_count<K>(&self, key: K) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync;

    /// 依評分由低到高分頁獲取，`page_index` 從 1 開始
    async fn sorted_set_get_page<K, V>(
        &self,
        key: K,
        page_index: usize,
        page_size: usize,
    ) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 依評分由低到高獲取所有成員
    async fn sorted_set_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;

    /// 設置有序集合的有效期
    async fn sorted_set_set_expire<K>(&self, key: K, ttl: Duration) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;

    /// 成員的評分，不存在時返回 None
    async fn sorted_set_get_item_score<K, V>(
        &self,
        key: K,
        value: &V,
    ) -> RedisManagerResult<Option<f64>>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;
}

impl<P: RedisPool> RedisManager<P> {
    async fn sorted_set_range<V: DeserializeOwned + Send>(
        &self,
        key: String,
        start: isize,
        stop: isize,
    ) -> RedisManagerResult<Vec<V>> {
        let mut conn = self.pool.get_read_conn().await?;
        let members: Vec<String> = conn.zrange(&key, start, stop).await.logged("ZRANGE", &key)?;
        debug!("有序集合讀取 {} [{}..{}]: {} 項", key, start, stop, members.len());
        from_json_all(members)
    }
}

#[async_trait]
impl<P: RedisPool> SortedSetOperations for RedisManager<P> {
    async fn sorted_set_add<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let score = lexical_score(&to_json(value)?);
        self.sorted_set_add_with_score(key, value, score).await
    }

    async fn sorted_set_add_with_score<K, V>(
        &self,
        key: K,
        value: &V,
        score: f64,
    ) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let member = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let added: i64 = cmd("ZADD")
            .arg(&key)
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await
            .logged("ZADD", &key)?;
        debug!(
            "有序集合添加 {} (評分 {}): {}",
            key,
            score,
            if added > 0 { "新成員" } else { "更新評分" }
        );
        Ok(added > 0)
    }

    async fn sorted_set_remove<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let member = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = conn.zrem(&key, member).await.logged("ZREM", &key)?;
        Ok(removed > 0)
    }

    async fn sorted_set_trim<K>(&self, key: K, size: usize) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: usize = cmd("ZREMRANGEBYRANK")
            .arg(&key)
            .arg(size)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .logged("ZREMRANGEBYRANK", &key)?;
        debug!("有序集合修剪 {}: 保留 {}，移除 {}", key, size, removed);
        Ok(removed)
    }

    async fn sorted_set_count<K>(&self, key: K) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.zcard(&key).await.logged("ZCARD", &key)
    }

    async fn sorted_set_get_page<K, V>(
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
            Some((start, stop)) => self.sorted_set_range(self.prefix_key(key), start, stop).await,
            None => Ok(Vec::new()),
        }
    }

    async fn sorted_set_get_all<K, V>(&self, key: K) -> RedisManagerResult<Vec<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        self.sorted_set_range(self.prefix_key(key), 0, -1).await
    }

    async fn sorted_set_set_expire<K>(&self, key: K, ttl: Duration) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let millis = ttl_millis(ttl)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        cmd("PEXPIRE")
            .arg(&key)
            .arg(millis)
            .query_async(&mut conn)
            .await
            .logged("PEXPIRE", &key)
    }

    async fn sorted_set_get_item_score<K, V>(
        &self,
        key: K,
        value: &V,
    ) -> RedisManagerResult<Option<f64>>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let member = to_json(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.zscore(&key, member).await.logged("ZSCORE", &key)
    }
}
