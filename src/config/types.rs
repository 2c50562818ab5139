use crate::config::validation::{ValidationError, ValidationUtils, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 應用程序配置結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.log.validate()?;
        self.redis.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::one_of_str(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        ValidationUtils::one_of_str(
            &self.format.to_lowercase(),
            &["pretty", "compact", "json"],
            "log.format",
        )?;

        Ok(())
    }
}

/// Redis連接池配置
///
/// 主機字串支援 `host:port`、`password@host:port` 或完整的 `redis://` URL，
/// 單一項目內也可用 `,` 或 `;` 分隔多台主機。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// 可寫的Redis主機
    pub read_write_hosts: Vec<String>,
    /// 唯讀的Redis主機，留空時讀取也走寫入連接池
    pub read_only_hosts: Vec<String>,
    /// 初始資料庫編號
    pub initial_db: i64,
    /// 每台可寫主機的最大連接數
    pub max_write_pool_size: u32,
    /// 每台唯讀主機的最大連接數
    pub max_read_pool_size: u32,
    /// 建立連接的超時（毫秒）
    pub connect_timeout_ms: u64,
    /// 從連接池取得連接的超時（毫秒）
    pub pool_timeout_ms: u64,
    /// 連接最長閒置時間（秒），0 表示不清理
    pub idle_timeout_secs: u64,
    /// 所有鍵的前綴
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            read_write_hosts: vec!["localhost:6379".to_string()],
            read_only_hosts: Vec::new(),
            initial_db: 0,
            max_write_pool_size: 5,
            max_read_pool_size: 5,
            connect_timeout_ms: 6000,
            pool_timeout_ms: 6000,
            idle_timeout_secs: 60,
            key_prefix: String::new(),
        }
    }
}

impl Validator for RedisConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::each_not_empty(&self.read_write_hosts, "redis.read_write_hosts")?;
        if !self.read_only_hosts.is_empty() {
            ValidationUtils::each_not_empty(&self.read_only_hosts, "redis.read_only_hosts")?;
        }
        ValidationUtils::in_range(self.initial_db, 0, 15, "redis.initial_db")?;
        ValidationUtils::in_range(self.max_write_pool_size, 1, 100, "redis.max_write_pool_size")?;
        ValidationUtils::in_range(self.max_read_pool_size, 1, 100, "redis.max_read_pool_size")?;
        ValidationUtils::in_range(
            self.connect_timeout_ms,
            100,
            60_000,
            "redis.connect_timeout_ms",
        )?;
        ValidationUtils::in_range(self.pool_timeout_ms, 100, 60_000, "redis.pool_timeout_ms")?;

        Ok(())
    }
}

impl RedisConfig {
    /// 建立連接超時
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// 取得連接超時
    pub fn pool_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_timeout_ms)
    }

    /// 閒置超時，未啟用時為 None
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}
