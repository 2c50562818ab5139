mod common;

use assert_matches::assert_matches;
use chrono::{Duration as ChronoDuration, Utc};
use deadpool_redis::redis::AsyncCommands;
use redis_manager::config::{validate_config, ApplicationConfig, RedisConfig};
use redis_manager::redis::{
    split_server_hosts, HashOperations, ItemOperations, KeyOperations, ListOperations,
    RedisEndpoint, RedisManagerError, RedisPoolError, SetOperations, SharedRedisManager,
    SortedSetOperations,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Session {
    user_id: u64,
    token: String,
    roles: Vec<String>,
}

fn session(user_id: u64) -> Session {
    Session {
        user_id,
        token: format!("tok-{}", user_id),
        roles: vec!["reader".to_string()],
    }
}

#[test]
fn test_default_config_is_valid() {
    let config = ApplicationConfig::default();
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.redis.read_write_hosts, vec!["localhost:6379".to_string()]);
}

#[test]
fn test_server_hosts_to_endpoints() {
    let hosts = split_server_hosts("secret@cache-a:6380;cache-b, redis://cache-c:6379/2", ",;");
    assert_eq!(hosts.len(), 3);

    let endpoints: Vec<RedisEndpoint> = hosts
        .iter()
        .map(|host| RedisEndpoint::parse(host, 1).expect("主機解析失敗"))
        .collect();
    assert_eq!(endpoints[0].to_url(), "redis://:secret@cache-a:6380/1");
    assert_eq!(endpoints[1].to_url(), "redis://cache-b:6379/1");
    assert_eq!(endpoints[2].to_url(), "redis://cache-c:6379/2");
}

#[test]
fn test_manager_requires_write_host() {
    let config = RedisConfig {
        read_write_hosts: Vec::new(),
        ..RedisConfig::default()
    };
    assert_matches!(
        SharedRedisManager::from_config(config),
        Err(RedisPoolError::PoolInitError(_))
    );
}

#[tokio::test]
async fn test_invalid_ttl_is_rejected_before_round_trip() {
    // 無法連線的主機也應在參數檢查時就失敗
    let config = RedisConfig {
        read_write_hosts: vec!["127.0.0.1:1".to_string()],
        ..RedisConfig::default()
    };
    let manager = SharedRedisManager::from_config(config).expect("無法創建存取輔助");

    let result = manager.item_set_expire("k", &1, Duration::from_micros(10)).await;
    assert_matches!(result, Err(RedisManagerError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_session_store_workflow() {
    let Some(manager) = common::setup_test_manager("session_store").await else {
        return;
    };

    // 單一項目
    manager
        .item_set_expire("session:1", &session(1), Duration::from_secs(30))
        .await
        .expect("寫入會話失敗");
    let loaded: Option<Session> = manager.item_get("session:1").await.expect("讀取會話失敗");
    assert_eq!(loaded, Some(session(1)));

    // 哈希表索引
    assert!(manager.hash_set("sessions", "1", &session(1)).await.expect("HSET失敗"));
    assert!(manager.hash_set("sessions", "2", &session(2)).await.expect("HSET失敗"));
    let mut all: Vec<Session> = manager.hash_get_all("sessions").await.expect("HVALS失敗");
    all.sort_by_key(|s| s.user_id);
    assert_eq!(all, vec![session(1), session(2)]);

    // 登入紀錄
    for user_id in 1..=5u64 {
        manager.list_add("logins", &user_id).await.expect("RPUSH失敗");
    }
    let page: Vec<u64> = manager.list_get_page("logins", 2, 2).await.expect("LRANGE失敗");
    assert_eq!(page, vec![3, 4]);
    let in_minute = Utc::now() + ChronoDuration::minutes(1);
    assert!(manager.list_set_expire("logins", in_minute).await.expect("EXPIREAT失敗"));

    // 線上使用者與排行
    assert!(manager.set_add("online", &1u64).await.expect("SADD失敗"));
    assert!(manager.set_contains("online", &1u64).await.expect("SISMEMBER失敗"));
    manager
        .sorted_set_add_with_score("ranking", &"u2", 20.0)
        .await
        .expect("ZADD失敗");
    manager
        .sorted_set_add_with_score("ranking", &"u1", 10.0)
        .await
        .expect("ZADD失敗");
    let ranking: Vec<String> = manager.sorted_set_get_all("ranking").await.expect("ZRANGE失敗");
    assert_eq!(ranking, vec!["u1", "u2"]);

    // 前綴內的鍵
    let mut keys = manager.get_all_keys().await.expect("KEYS失敗");
    keys.sort();
    assert_eq!(keys, vec!["logins", "online", "ranking", "session:1", "sessions"]);

    let removed = manager.remove_all(&keys).await.expect("DEL失敗");
    assert_eq!(removed, 5);
    assert!(manager.get_all_keys().await.expect("KEYS失敗").is_empty());
}

#[tokio::test]
async fn test_read_only_connections_see_writes() {
    let Some(manager) = common::setup_test_manager("read_split").await else {
        return;
    };

    manager.item_set("shared", &"value").await.expect("SET失敗");

    let mut conn = manager.get_read_only_client().await.expect("無法獲取唯讀連接");
    let key = format!("{}shared", manager.key_prefix());
    let raw: Option<String> = conn.get(&key).await.expect("GET失敗");
    assert_eq!(raw.as_deref(), Some("\"value\""));

    assert!(manager.remove("shared").await.expect("DEL失敗"));
}
