use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use redis_manager::config::{self, LogConfig};
use redis_manager::redis::{
    init_redis_manager, ItemOperations, KeyOperations, RedisPool, SharedRedisManager,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "redis_console", about = "Redis 存取輔助命令行工具")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 寫入 Name 與 Age、保存後讀回（預設命令）
    Demo,

    /// 讀取鍵的值
    Get { key: String },

    /// 寫入鍵的值，無法解析為 JSON 時以字串保存
    Set {
        key: String,
        value: String,
        /// 有效期（秒）
        #[arg(long)]
        ttl_secs: Option<u64>,
    },

    /// 刪除鍵
    Del { keys: Vec<String> },

    /// 列出所有鍵
    Keys,

    /// 顯示伺服器資訊
    Info {
        /// 只顯示指定欄位
        #[arg(short, long)]
        field: Option<String>,
    },

    /// 清空所有資料庫
    Flush {
        /// 確認清空
        #[arg(long)]
        yes: bool,
    },

    /// 檢查連接池健康狀態
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化配置
    let app_config = config::init_config()?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    let cli = Cli::parse();

    let redis =
        init_redis_manager(app_config.redis.clone()).context("無法初始化Redis存取輔助")?;
    let _reaper = redis.pool().spawn_idle_reaper();

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => run_demo(redis).await?,
        Commands::Get { key } => {
            let value: Option<Value> = redis.item_get(&key).await?;
            match value {
                Some(value) => println!("{}", value),
                None => println!("(nil)"),
            }
        }
        Commands::Set {
            key,
            value,
            ttl_secs,
        } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            match ttl_secs {
                Some(secs) => {
                    let ttl = Duration::from_secs(secs);
                    redis.item_set_expire(&key, &value, ttl).await?
                }
                None => redis.item_set(&key, &value).await?,
            };
            println!("OK");
        }
        Commands::Del { keys } => {
            let removed = redis.remove_all(&keys).await?;
            println!("(integer) {}", removed);
        }
        Commands::Keys => {
            let mut keys = redis.get_all_keys().await?;
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
        Commands::Info { field } => {
            let info = redis.get_info().await?;
            match field {
                Some(field) => {
                    let value = info
                        .get(&field)
                        .ok_or_else(|| anyhow!("INFO 中沒有欄位: {}", field))?;
                    println!("{}", value);
                }
                None => {
                    let mut entries: Vec<_> = info.into_iter().collect();
                    entries.sort();
                    for (name, value) in entries {
                        println!("{}:{}", name, value);
                    }
                }
            }
        }
        Commands::Flush { yes } => {
            if !yes {
                return Err(anyhow!("清空所有資料庫需要加上 --yes"));
            }
            redis.flush_all().await?;
            println!("OK");
        }
        Commands::Health => {
            let healthy = redis.pool().check_health().await;
            let status = redis.pool().status();
            println!(
                "healthy={} size={} available={} max_size={}",
                healthy, status.size, status.available, status.max_size
            );
            if !healthy {
                return Err(anyhow!("Redis健康檢查失敗"));
            }
        }
    }

    Ok(())
}

async fn run_demo(redis: &SharedRedisManager) -> Result<()> {
    redis.item_set("Name", &"Kiba5181").await?;
    redis.item_set("Age", &100001).await?;
    redis.save().await?;

    let name: Option<String> = redis.item_get("Name").await?;
    let age: Option<i32> = redis.item_get("Age").await?;
    println!(
        "MyName:{}====MyAge:{}",
        name.unwrap_or_default(),
        age.unwrap_or_default()
    );
    Ok(())
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let level = log_config.level.to_lowercase();
    let (filter, rejected_level) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => match EnvFilter::try_new(&level) {
            Ok(filter) => (filter, None),
            Err(e) => (EnvFilter::new("info"), Some(e)),
        },
    };
    let builder = FmtSubscriber::builder().with_env_filter(filter);

    let result = match log_format(log_config) {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish()),
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish()),
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    if let Some(e) = rejected_level {
        warn!("無效的日誌級別 {}，改用 info: {}", log_config.level, e);
    }
    info!("日誌系統初始化完成");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

// 與配置驗證一致，不分大小寫
fn log_format(log_config: &LogConfig) -> LogFormat {
    match log_config.format.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        "compact" => LogFormat::Compact,
        _ => LogFormat::Pretty,
    }
}
