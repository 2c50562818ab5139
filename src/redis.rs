//! Redis存取模組
//!
//! 以連接池管理器包裝 deadpool-redis，並在其上提供依資料結構分類的
//! 型別化操作：項目、列表、集合、哈希表、有序集合與二進位物件。

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod manager;
pub mod operations;
pub mod pool;

#[cfg(test)]
pub mod test_config;

pub use endpoint::{split_server_hosts, RedisEndpoint};
pub use error::{RedisManagerError, RedisManagerResult};
pub use manager::{init_redis_manager, redis_manager, RedisManager, SharedRedisManager};
pub use operations::*;
pub use pool::*;

#[cfg(test)]
mod tests {
    use super::pool::RedisPool;

    #[test]
    fn test_module_exports() {
        async fn _ensure_redis_pool_works<P: RedisPool>(pool: &P) {
            let _ = pool.check_health().await;
            let _ = pool.pool_size();
        }

        async fn _ensure_manager_works(manager: &super::SharedRedisManager) {
            use super::{ItemOperations, KeyOperations};
            let _ = manager.ping().await;
            let _: super::RedisManagerResult<Option<String>> = manager.item_get("k").await;
        }
    }
}
