// 模組定義
pub mod config;
pub mod redis;
