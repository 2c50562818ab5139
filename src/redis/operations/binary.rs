use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::redis::{cmd, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{millis_until, RedisResultExt};
use crate::redis::codec::{from_binary, to_binary};
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 位圖與二進位物件操作
#[async_trait]
pub trait BinaryOperations: Send + Sync + 'static {
    /// 設置位圖中 `offset` 的位元，返回原本的值
    async fn bit_set<K>(&self, key: K, offset: usize, value: bool) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;

    /// 讀取位圖中 `offset` 的位元
    async fn bit_get<K>(&self, key: K, offset: usize) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;

    /// 以 bincode 編碼後寫入
    async fn byte_set<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 以 bincode 編碼後寫入，到 `expire_at` 時刪除
    ///
    /// `expire_at` 已過去時不寫入並返回 false。
    async fn byte_set_expire<K, V>(
        &self,
        key: K,
        value: &V,
        expire_at: DateTime<Utc>,
    ) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync;

    /// 讀取並解碼，鍵不存在或內容為空時返回 None
    async fn byte_get<K, V>(&self, key: K) -> RedisManagerResult<Option<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync;
}

#[async_trait]
impl<P: RedisPool> BinaryOperations for RedisManager<P> {
    async fn bit_set<K>(&self, key: K, offset: usize, value: bool) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let previous: u8 = cmd("SETBIT")
            .arg(&key)
            .arg(offset)
            .arg(u8::from(value))
            .query_async(&mut conn)
            .await
            .logged("SETBIT", &key)?;
        Ok(previous == 1)
    }

    async fn bit_get<K>(&self, key: K, offset: usize) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        let bit: u8 = cmd("GETBIT")
            .arg(&key)
            .arg(offset)
            .query_async(&mut conn)
            .await
            .logged("GETBIT", &key)?;
        Ok(bit == 1)
    }

    async fn byte_set<K, V>(&self, key: K, value: &V) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let bytes = to_binary(value)?;
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        conn.set::<_, _, ()>(&key, &bytes).await.logged("SET", &key)?;
        debug!("二進位物件寫入 {}: {} 位元組", key, bytes.len());
        Ok(true)
    }

    async fn byte_set_expire<K, V>(
        &self,
        key: K,
        value: &V,
        expire_at: DateTime<Utc>,
    ) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key = self.prefix_key(key);
        let Some(millis) = millis_until(expire_at, Utc::now()) else {
            warn!("過期時間 {} 已過去，略過寫入: {}", expire_at, key);
            return Ok(false);
        };

        let bytes = to_binary(value)?;
        let mut conn = self.pool.get_conn().await?;

        cmd("SET")
            .arg(&key)
            .arg(&bytes)
            .arg("PX")
            .arg(millis)
            .query_async::<()>(&mut conn)
            .await
            .logged("SET PX", &key)?;
        debug!("二進位物件寫入 {}: {} 位元組，{}ms 後過期", key, bytes.len(), millis);
        Ok(true)
    }

    async fn byte_get<K, V>(&self, key: K) -> RedisManagerResult<Option<V>>
    where
        K: AsRef<str> + Send + Sync,
        V: DeserializeOwned + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        let bytes: Option<Vec<u8>> = conn.get(&key).await.logged("GET", &key)?;
        match bytes {
            Some(bytes) if !bytes.is_empty() => from_binary(&bytes).map(Some),
            _ => {
                debug!("二進位物件不存在: {}", key);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::operations::KeyOperations;
    use crate::redis::test_config::RedisTestConfig;
    use chrono::Duration as ChronoDuration;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Snapshot {
        version: u32,
        payload: Vec<u8>,
        label: Option<String>,
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            version: 3,
            payload: vec![0, 1, 2, 255],
            label: Some("nightly".to_string()),
        }
    }

    #[tokio::test]
    async fn test_bit_operations() {
        let Some(manager) =
            RedisTestConfig::skip_if_manager_unavailable("test_bit_operations").await
        else {
            return;
        };
        let key = RedisTestConfig::unique_key("bits");

        assert!(!manager.bit_set(&key, 7, true).await.expect("SETBIT失敗"));
        assert!(manager.bit_set(&key, 7, true).await.expect("SETBIT失敗"));
        assert!(manager.bit_get(&key, 7).await.expect("GETBIT失敗"));
        assert!(!manager.bit_get(&key, 6).await.expect("GETBIT失敗"));
        assert!(!manager.bit_get(&key, 10_000).await.expect("GETBIT失敗"));

        assert!(manager.bit_set(&key, 7, false).await.expect("SETBIT失敗"));
        assert!(!manager.bit_get(&key, 7).await.expect("GETBIT失敗"));

        let _ = manager.remove(&key).await;
    }

    #[tokio::test]
    async fn test_byte_operations() {
        let Some(manager) =
            RedisTestConfig::skip_if_manager_unavailable("test_byte_operations").await
        else {
            return;
        };
        let key = RedisTestConfig::unique_key("bytes");

        assert!(manager.byte_set(&key, &snapshot()).await.expect("SET失敗"));
        let loaded: Option<Snapshot> = manager.byte_get(&key).await.expect("GET失敗");
        assert_eq!(loaded, Some(snapshot()));

        let missing: Option<Snapshot> = manager
            .byte_get(RedisTestConfig::unique_key("no_bytes"))
            .await
            .expect("GET失敗");
        assert_eq!(missing, None);

        let _ = manager.remove(&key).await;
    }

    #[tokio::test]
    async fn test_byte_get_empty_blob() {
        let Some(manager) =
            RedisTestConfig::skip_if_manager_unavailable("test_byte_get_empty_blob").await
        else {
            return;
        };
        let key = RedisTestConfig::unique_key("empty_bytes");

        let mut conn = manager.get_client().await.expect("無法獲取連接");
        let _: () = conn.set(&key, Vec::<u8>::new()).await.expect("SET失敗");
        drop(conn);

        assert!(manager.contains_key(&key).await.expect("EXISTS失敗"));
        let loaded: Option<Snapshot> = manager.byte_get(&key).await.expect("GET失敗");
        assert_eq!(loaded, None);

        let _ = manager.remove(&key).await;
    }

    #[tokio::test]
    async fn test_byte_set_expire() {
        let Some(manager) =
            RedisTestConfig::skip_if_manager_unavailable("test_byte_set_expire").await
        else {
            return;
        };
        let key = RedisTestConfig::unique_key("bytes_expire");

        let past = Utc::now() - ChronoDuration::seconds(5);
        assert!(!manager.byte_set_expire(&key, &snapshot(), past).await.expect("寫入失敗"));
        assert!(!manager.contains_key(&key).await.expect("EXISTS失敗"));

        let soon = Utc::now() + ChronoDuration::milliseconds(400);
        assert!(manager.byte_set_expire(&key, &snapshot(), soon).await.expect("寫入失敗"));
        assert!(manager.contains_key(&key).await.expect("EXISTS失敗"));

        tokio::time::sleep(std::time::Duration::from_millis(800)).await;
        let gone: Option<Snapshot> = manager.byte_get(&key).await.expect("GET失敗");
        assert_eq!(gone, None);
    }
}
