use super::endpoint::{parse_hosts, RedisEndpoint};
use crate::config::types::RedisConfig;
use async_trait::async_trait;
use deadpool::managed::QueueMode;
use deadpool_redis::{
    redis::{cmd, RedisError},
    Config, Connection, CreatePoolError, Pool, PoolConfig, PoolError, Runtime, Timeouts,
};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Redis連接池錯誤
#[derive(Error, Debug)]
pub enum RedisPoolError {
    /// 連接池初始化錯誤
    #[error("Redis連接池初始化錯誤: {0}")]
    PoolInitError(String),

    /// 主機字串格式錯誤
    #[error("無效的Redis主機: {0}")]
    InvalidHost(String),

    /// 無法獲取連接
    #[error("無法從連接池獲取連接: {0}")]
    GetConnectionError(String),

    /// Redis原生錯誤
    #[error("Redis原生錯誤: {0}")]
    NativeRedisError(#[from] RedisError),
}

/// 從deadpool-redis錯誤轉換為RedisPoolError
impl From<PoolError> for RedisPoolError {
    fn from(error: PoolError) -> Self {
        RedisPoolError::GetConnectionError(error.to_string())
    }
}

/// 從deadpool-redis創建錯誤轉換為RedisPoolError
impl From<CreatePoolError> for RedisPoolError {
    fn from(error: CreatePoolError) -> Self {
        RedisPoolError::PoolInitError(error.to_string())
    }
}

/// Redis連接池接口
#[async_trait]
pub trait RedisPool: Send + Sync + 'static {
    /// 獲取可寫連接
    async fn get_conn(&self) -> Result<Connection, RedisPoolError>;

    /// 獲取唯讀連接，未配置唯讀主機時與 `get_conn` 相同
    async fn get_read_conn(&self) -> Result<Connection, RedisPoolError> {
        self.get_conn().await
    }

    /// 檢查連接池健康狀態
    async fn check_health(&self) -> bool;

    /// 獲取連接池大小
    fn pool_size(&self) -> u32;
}

/// 單台主機的連接池
struct HostPool {
    endpoint: RedisEndpoint,
    pool: Pool,
}

impl HostPool {
    fn new(
        endpoint: RedisEndpoint,
        max_size: u32,
        config: &RedisConfig,
    ) -> Result<Self, RedisPoolError> {
        let mut cfg = Config::from_url(endpoint.to_url());

        cfg.pool = Some(PoolConfig {
            max_size: max_size as usize,
            timeouts: Timeouts {
                wait: Some(config.pool_timeout()),
                create: Some(config.connect_timeout()),
                recycle: Some(config.connect_timeout()),
            },
            queue_mode: QueueMode::Fifo,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { endpoint, pool })
    }
}

/// 連接池統計（所有主機加總）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatus {
    pub max_size: usize,
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

/// 支援讀寫分離的Redis連接池管理器
///
/// 每台主機各自擁有一個 deadpool 連接池，同一角色的多台主機以輪詢方式分配，
/// 取得連接失敗時依序嘗試下一台。
pub struct PooledClientManager {
    write_pools: Vec<HostPool>,
    read_pools: Vec<HostPool>,
    write_cursor: AtomicUsize,
    read_cursor: AtomicUsize,
    config: RedisConfig,
}

impl PooledClientManager {
    /// 創建新的連接池管理器，此時尚未建立任何連接
    pub fn new(config: RedisConfig) -> Result<Self, RedisPoolError> {
        let write_endpoints = parse_hosts(&config.read_write_hosts, config.initial_db)?;
        if write_endpoints.is_empty() {
            return Err(RedisPoolError::PoolInitError("未配置任何可寫主機".to_string()));
        }
        let read_endpoints = parse_hosts(&config.read_only_hosts, config.initial_db)?;

        let write_pools = write_endpoints
            .into_iter()
            .map(|endpoint| HostPool::new(endpoint, config.max_write_pool_size, &config))
            .collect::<Result<Vec<_>, _>>()?;
        let read_pools = read_endpoints
            .into_iter()
            .map(|endpoint| HostPool::new(endpoint, config.max_read_pool_size, &config))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Redis連接池初始化完成，可寫主機: {}，唯讀主機: {}，每台大小: {}/{}",
            write_pools.len(),
            read_pools.len(),
            config.max_write_pool_size,
            config.max_read_pool_size
        );

        Ok(Self {
            write_pools,
            read_pools,
            write_cursor: AtomicUsize::new(0),
            read_cursor: AtomicUsize::new(0),
            config,
        })
    }

    /// 使用中的配置
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// 可寫主機列表
    pub fn write_endpoints(&self) -> Vec<&RedisEndpoint> {
        self.write_pools.iter().map(|p| &p.endpoint).collect()
    }

    /// 唯讀主機列表
    pub fn read_endpoints(&self) -> Vec<&RedisEndpoint> {
        self.read_pools.iter().map(|p| &p.endpoint).collect()
    }

    /// 所有主機連接池的統計
    pub fn status(&self) -> PoolStatus {
        self.write_pools
            .iter()
            .chain(self.read_pools.iter())
            .map(|p| p.pool.status())
            .fold(PoolStatus::default(), |acc, s| PoolStatus {
                max_size: acc.max_size + s.max_size,
                size: acc.size + s.size,
                available: acc.available + s.available,
                waiting: acc.waiting + s.waiting,
            })
    }

    /// 關閉閒置超過 `idle_timeout_secs` 的連接，返回關閉的數量
    pub fn prune_idle(&self) -> usize {
        let Some(idle) = self.config.idle_timeout() else {
            return 0;
        };

        self.write_pools
            .iter()
            .chain(self.read_pools.iter())
            .map(|p| {
                p.pool
                    .retain(|_, metrics| metrics.last_used() < idle)
                    .removed
                    .len()
            })
            .sum()
    }

    /// 啟動背景任務定期清理閒置連接
    ///
    /// 未啟用閒置超時時返回 None；管理器被釋放後任務自行結束。
    pub fn spawn_idle_reaper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let idle = self.config.idle_timeout()?;
        let manager = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(idle);
            // 第一次 tick 立即完成
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    debug!("連接池已釋放，停止閒置清理");
                    break;
                };
                let removed = manager.prune_idle();
                if removed > 0 {
                    debug!("已關閉 {} 條閒置Redis連接", removed);
                }
            }
        }))
    }

    /// 輪詢挑選主機並取得連接，失敗時換下一台
    async fn acquire(
        pools: &[HostPool],
        cursor: &AtomicUsize,
    ) -> Result<Connection, RedisPoolError> {
        let start = cursor.fetch_add(1, Ordering::Relaxed);
        let mut last_error = None;

        for offset in 0..pools.len() {
            let host = &pools[(start + offset) % pools.len()];
            match host.pool.get().await {
                Ok(conn) => {
                    debug!("從Redis連接池獲取連接成功: {}", host.endpoint);
                    return Ok(conn);
                }
                Err(e) => {
                    warn!("無法從Redis連接池獲取連接 {}: {}", host.endpoint, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => {
                error!("所有Redis主機均無法取得連接: {}", e);
                Err(e.into())
            }
            None => Err(RedisPoolError::GetConnectionError("沒有可用的主機".to_string())),
        }
    }
}

/// 只輸出不含密碼的主機與統計
impl fmt::Debug for PooledClientManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hosts = |pools: &[HostPool]| -> Vec<String> {
            pools.iter().map(|p| p.endpoint.to_string()).collect()
        };
        f.debug_struct("PooledClientManager")
            .field("write_hosts", &hosts(&self.write_pools))
            .field("read_hosts", &hosts(&self.read_pools))
            .field("status", &self.status())
            .finish()
    }
}

#[async_trait]
impl RedisPool for PooledClientManager {
    async fn get_conn(&self) -> Result<Connection, RedisPoolError> {
        Self::acquire(&self.write_pools, &self.write_cursor).await
    }

    async fn get_read_conn(&self) -> Result<Connection, RedisPoolError> {
        if self.read_pools.is_empty() {
            return self.get_conn().await;
        }
        Self::acquire(&self.read_pools, &self.read_cursor).await
    }

    async fn check_health(&self) -> bool {
        match self.get_conn().await {
            Ok(mut conn) => {
                let result: Result<String, RedisError> = cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(pong) => pong == "PONG",
                    Err(e) => {
                        error!("Redis健康檢查錯誤: {}", e);
                        false
                    }
                }
            }
            Err(e) => {
                error!("Redis健康檢查無法獲取連接: {}", e);
                false
            }
        }
    }

    fn pool_size(&self) -> u32 {
        let writes = self.write_pools.len() as u32 * self.config.max_write_pool_size;
        let reads = self.read_pools.len() as u32 * self.config.max_read_pool_size;
        writes + reads
    }
}

/// Arc<PooledClientManager> 也實現 RedisPool trait，便於共享連接池
#[async_trait]
impl RedisPool for Arc<PooledClientManager> {
    async fn get_conn(&self) -> Result<Connection, RedisPoolError> {
        (**self).get_conn().await
    }

    async fn get_read_conn(&self) -> Result<Connection, RedisPoolError> {
        (**self).get_read_conn().await
    }

    async fn check_health(&self) -> bool {
        (**self).check_health().await
    }

    fn pool_size(&self) -> u32 {
        (**self).pool_size()
    }
}
