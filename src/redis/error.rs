use super::pool::RedisPoolError;
use deadpool_redis::redis::RedisError;
use thiserror::Error;

/// Redis存取輔助層錯誤
#[derive(Error, Debug)]
pub enum RedisManagerError {
    /// 連接池錯誤
    #[error("Redis連接錯誤: {0}")]
    Pool(#[from] RedisPoolError),

    /// Redis命令錯誤
    #[error("Redis操作錯誤: {0}")]
    Redis(#[from] RedisError),

    /// 序列化錯誤
    #[error("數據序列化錯誤: {0}")]
    Serialization(String),

    /// 反序列化錯誤
    #[error("數據反序列化錯誤: {0}")]
    Deserialization(String),

    /// 參數錯誤
    #[error("無效的參數: {0}")]
    InvalidArgument(String),

    /// 配置錯誤
    #[error("配置錯誤: {0}")]
    Config(String),
}

pub type RedisManagerResult<T> = Result<T, RedisManagerError>;
