use async_trait::async_trait;
use deadpool_redis::redis::{cmd, AsyncCommands};
use std::collections::HashMap;
use tracing::{debug, info};

use super::RedisResultExt;
use crate::redis::error::RedisManagerResult;
use crate::redis::manager::RedisManager;
use crate::redis::pool::RedisPool;

/// 鍵與伺服器層級操作
#[async_trait]
pub trait KeyOperations: Send + Sync + 'static {
    /// 獲取目前資料庫中的所有鍵（已去除前綴）
    async fn get_all_keys(&self) -> RedisManagerResult<Vec<String>>;

    /// 移除多個鍵，返回實際移除的數量
    async fn remove_all<K>(&self, keys: &[K]) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync;

    /// 確定鍵是否存在
    async fn contains_key<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;

    /// 移除鍵
    async fn remove<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync;

    /// 清空所有資料庫
    async fn flush_all(&self) -> RedisManagerResult<()>;

    /// 同步保存資料到磁碟
    async fn save(&self) -> RedisManagerResult<()>;

    /// 伺服器資訊
    async fn get_info(&self) -> RedisManagerResult<HashMap<String, String>>;

    /// 執行PING命令
    async fn ping(&self) -> RedisManagerResult<String>;
}

/// 轉義 KEYS 模式中的特殊字元
fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// 解析 INFO 輸出，忽略空行與段落標題
pub fn parse_info(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[async_trait]
impl<P: RedisPool> KeyOperations for RedisManager<P> {
    async fn get_all_keys(&self) -> RedisManagerResult<Vec<String>> {
        let pattern = format!("{}*", escape_glob(self.key_prefix()));
        let mut conn = self.pool.get_read_conn().await?;

        let keys: Vec<String> = conn.keys(&pattern).await.logged("KEYS", &pattern)?;
        debug!("KEYS {}: {} 個鍵", pattern, keys.len());
        Ok(keys.into_iter().map(|key| self.strip_prefix(key)).collect())
    }

    async fn remove_all<K>(&self, keys: &[K]) -> RedisManagerResult<usize>
    where
        K: AsRef<str> + Send + Sync,
    {
        if keys.is_empty() {
            return Ok(0);
        }

        let prefixed: Vec<String> = keys.iter().map(|key| self.prefix_key(key)).collect();
        let mut conn = self.pool.get_conn().await?;

        let removed: usize = conn
            .del(&prefixed)
            .await
            .logged("DEL", &prefixed.join(","))?;
        debug!("批量刪除 {} 個鍵，實際移除 {}", prefixed.len(), removed);
        Ok(removed)
    }

    async fn contains_key<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_read_conn().await?;

        conn.exists(&key).await.logged("EXISTS", &key)
    }

    async fn remove<K>(&self, key: K) -> RedisManagerResult<bool>
    where
        K: AsRef<str> + Send + Sync,
    {
        let key = self.prefix_key(key);
        let mut conn = self.pool.get_conn().await?;

        let removed: i64 = conn.del(&key).await.logged("DEL", &key)?;
        Ok(removed > 0)
    }

    async fn flush_all(&self) -> RedisManagerResult<()> {
        let mut conn = self.pool.get_conn().await?;

        cmd("FLUSHALL")
            .query_async::<()>(&mut conn)
            .await
            .logged("FLUSHALL", "*")?;
        info!("Redis所有資料已清空");
        Ok(())
    }

    async fn save(&self) -> RedisManagerResult<()> {
        let mut conn = self.pool.get_conn().await?;

        cmd("SAVE").query_async::<()>(&mut conn).await.logged("SAVE", "*")?;
        debug!("Redis資料已保存");
        Ok(())
    }

    async fn get_info(&self) -> RedisManagerResult<HashMap<String, String>> {
        let mut conn = self.pool.get_read_conn().await?;

        let raw: String = cmd("INFO").query_async(&mut conn).await.logged("INFO", "*")?;
        Ok(parse_info(&raw))
    }

    async fn ping(&self) -> RedisManagerResult<String> {
        let mut conn = self.pool.get_conn().await?;

        cmd("PING").query_async(&mut conn).await.logged("PING", "*")
    }
}
