/// 配置管理模組
///
/// 負責加載、驗證並保存 Redis 連接池與日誌的配置。
/// 依 `REDIS_MANAGER_ENV` 選擇開發或生產環境的配置檔。
pub mod loader;
pub mod manager;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigExt, ConfigLoader, Environment};
pub use manager::{get_config, init_config};
pub use types::*;
pub use validation::{validate_config, ValidationError, ValidationUtils, Validator};
