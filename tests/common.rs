use redis_manager::config::RedisConfig;
use redis_manager::redis::{RedisPool, SharedRedisManager};

/// 測試用 Redis URL
pub fn redis_test_url() -> String {
    std::env::var("REDIS_TEST_URL").unwrap_or_else(|_| {
        // Docker 環境中使用服務名稱 "redis"
        if std::path::Path::new("/.dockerenv").exists() {
            "redis://redis:6379".to_string()
        } else {
            "redis://localhost:6379".to_string()
        }
    })
}

/// 測試用 Redis 配置
pub fn redis_test_config(key_prefix: &str) -> RedisConfig {
    RedisConfig {
        read_write_hosts: vec![redis_test_url()],
        read_only_hosts: vec![redis_test_url()],
        max_write_pool_size: 2,
        max_read_pool_size: 2,
        connect_timeout_ms: 1000,
        pool_timeout_ms: 1000,
        key_prefix: key_prefix.to_string(),
        ..RedisConfig::default()
    }
}

/// 建立以唯一前綴隔離的存取輔助，Redis 不可用時返回 None
pub async fn setup_test_manager(test_name: &str) -> Option<SharedRedisManager> {
    let prefix = format!("redis_manager_it:{}:{}:", test_name, uuid::Uuid::new_v4());
    let manager = SharedRedisManager::from_config(redis_test_config(&prefix)).ok()?;
    if manager.pool().check_health().await {
        Some(manager)
    } else {
        println!("跳過 '{}' - Redis 環境不可用", test_name);
        None
    }
}
