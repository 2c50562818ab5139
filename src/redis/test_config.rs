//! 集中化的 Redis 測試配置
//!
//! 提供一致的測試環境配置，支援不同部署環境（本地開發、Docker 容器）

use crate::config::types::RedisConfig;
use crate::redis::manager::SharedRedisManager;
use crate::redis::pool::{PooledClientManager, RedisPool, RedisPoolError};
use std::sync::Arc;

/// Redis 測試配置建構器
pub struct RedisTestConfig;

impl RedisTestConfig {
    /// 獲取測試用 Redis URL
    ///
    /// 優先級：
    /// 1. REDIS_TEST_URL 環境變數
    /// 2. 檢測 Docker 環境使用 redis:6379
    /// 3. 預設 localhost:6379
    pub fn get_test_url() -> String {
        Self::resolve_test_url(
            std::env::var("REDIS_TEST_URL").ok(),
            Self::is_docker_environment(),
        )
    }

    fn resolve_test_url(configured: Option<String>, in_docker: bool) -> String {
        match configured {
            Some(url) => url,
            None if in_docker => "redis://redis:6379".to_string(),
            None => "redis://localhost:6379".to_string(),
        }
    }

    /// 檢測是否在 Docker 環境中執行
    fn is_docker_environment() -> bool {
        std::env::var("DOCKER_CONTAINER").is_ok()
            || std::env::var("HOSTNAME")
                .map(|h| h.starts_with("redis-manager"))
                .unwrap_or(false)
    }

    /// 建立標準測試 Redis 配置
    pub fn create_test_config() -> RedisConfig {
        RedisConfig {
            read_write_hosts: vec![Self::get_test_url()],
            read_only_hosts: Vec::new(),
            initial_db: 0,
            max_write_pool_size: 3,
            max_read_pool_size: 3,
            connect_timeout_ms: 1000,
            pool_timeout_ms: 1000,
            idle_timeout_secs: 0,
            key_prefix: String::new(),
        }
    }

    /// 建立測試用 Redis 連接池
    pub fn create_test_pool() -> Result<Arc<PooledClientManager>, RedisPoolError> {
        Ok(Arc::new(PooledClientManager::new(Self::create_test_config())?))
    }

    /// 產生不會與其他測試衝突的鍵
    pub fn unique_key(base: &str) -> String {
        format!("redis_manager_test:{}:{}", base, uuid::Uuid::new_v4())
    }

    /// 檢查 Redis 是否可用於測試
    pub async fn is_redis_available() -> bool {
        match Self::create_test_pool() {
            Ok(pool) => pool.check_health().await,
            Err(_) => false,
        }
    }

    /// Redis 可用時返回測試連接池，否則記錄並跳過
    pub async fn skip_if_redis_unavailable(test_name: &str) -> Option<Arc<PooledClientManager>> {
        let pool = Self::create_test_pool().ok()?;
        if pool.check_health().await {
            Some(pool)
        } else {
            println!("跳過 Redis 測試 '{}' - Redis 環境不可用", test_name);
            None
        }
    }

    /// Redis 可用時返回無前綴的存取輔助，否則跳過
    pub async fn skip_if_manager_unavailable(test_name: &str) -> Option<SharedRedisManager> {
        Self::skip_if_redis_unavailable(test_name)
            .await
            .map(SharedRedisManager::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_test_url() {
        assert_eq!(
            RedisTestConfig::resolve_test_url(Some("redis://custom:1234".to_string()), true),
            "redis://custom:1234"
        );
        assert_eq!(
            RedisTestConfig::resolve_test_url(None, true),
            "redis://redis:6379"
        );
        assert_eq!(
            RedisTestConfig::resolve_test_url(None, false),
            "redis://localhost:6379"
        );
    }

    #[test]
    fn test_create_test_config() {
        let config = RedisTestConfig::create_test_config();
        assert!(config.read_write_hosts[0].starts_with("redis://"));
        assert_eq!(config.max_write_pool_size, 3);
        assert_eq!(config.idle_timeout(), None);
    }

    #[test]
    fn test_unique_key_differs() {
        let a = RedisTestConfig::unique_key("k");
        let b = RedisTestConfig::unique_key("k");
        assert_ne!(a, b);
        assert!(a.starts_with("redis_manager_test:k:"));
    }
}
