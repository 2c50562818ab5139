use super::error::{RedisManagerError, RedisManagerResult};
use super::pool::{PooledClientManager, RedisPool, RedisPoolError};
use crate::config::{get_config, types::RedisConfig};
use deadpool_redis::Connection;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, warn};

/// 進程共用的Redis存取輔助實例類型
pub type SharedRedisManager = RedisManager<Arc<PooledClientManager>>;

// 全局實例
static REDIS_MANAGER: OnceCell<SharedRedisManager> = OnceCell::new();

/// Redis存取輔助
///
/// 每個操作都從連接池取得一條連接，執行對應命令後在返回時歸還。
/// 各類操作由 `operations` 下的特質提供。
#[derive(Debug)]
pub struct RedisManager<P: RedisPool> {
    pub(crate) pool: P,
    key_prefix: String,
}

impl<P: RedisPool> RedisManager<P> {
    /// 創建新的存取輔助，不加鍵前綴
    pub fn new(pool: P) -> Self {
        Self::with_prefix(pool, "")
    }

    /// 創建新的存取輔助，所有鍵都會加上 `key_prefix`
    pub fn with_prefix(pool: P, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    /// 底層連接池
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// 鍵前綴
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// 取得一條可寫連接，由呼叫者持有直到釋放
    pub async fn get_client(&self) -> RedisManagerResult<Connection> {
        Ok(self.pool.get_conn().await?)
    }

    /// 取得一條唯讀連接
    pub async fn get_read_only_client(&self) -> RedisManagerResult<Connection> {
        Ok(self.pool.get_read_conn().await?)
    }

    pub(crate) fn prefix_key<K: AsRef<str>>(&self, key: K) -> String {
        format!("{}{}", self.key_prefix, key.as_ref())
    }

    pub(crate) fn strip_prefix(&self, key: String) -> String {
        match key.strip_prefix(self.key_prefix.as_str()) {
            Some(stripped) if !self.key_prefix.is_empty() => stripped.to_string(),
            _ => key,
        }
    }
}

impl SharedRedisManager {
    /// 依配置建立連接池與存取輔助
    pub fn from_config(config: RedisConfig) -> Result<Self, RedisPoolError> {
        let key_prefix = config.key_prefix.clone();
        let pool = Arc::new(PooledClientManager::new(config)?);
        Ok(Self::with_prefix(pool, key_prefix))
    }
}

/// 以指定配置初始化全局實例
///
/// 已初始化時保留既有實例並記錄警告。
pub fn init_redis_manager(config: RedisConfig) -> RedisManagerResult<&'static SharedRedisManager> {
    let manager = SharedRedisManager::from_config(config)?;
    if REDIS_MANAGER.set(manager).is_err() {
        warn!("Redis存取輔助已經被初始化，跳過重複初始化");
    } else {
        debug!("Redis存取輔助初始化成功");
    }
    redis_manager()
}

/// 獲取全局實例，尚未初始化時依全局配置建立
pub fn redis_manager() -> RedisManagerResult<&'static SharedRedisManager> {
    REDIS_MANAGER.get_or_try_init(|| {
        debug!("依全局配置建立Redis存取輔助");
        SharedRedisManager::from_config(get_config().redis.clone())
            .map_err(|e| RedisManagerError::Config(e.to_string()))
    })
}
