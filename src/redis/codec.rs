//! 值的編碼
//!
//! 一般資料結構以 JSON 儲存，位元組操作則使用 bincode。

use super::error::{RedisManagerError, RedisManagerResult};
use serde::{de::DeserializeOwned, Serialize};

/// 編碼為 JSON 字串
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> RedisManagerResult<String> {
    serde_json::to_string(value).map_err(|e| RedisManagerError::Serialization(e.to_string()))
}

/// 從 JSON 字串解碼
pub fn from_json<T: DeserializeOwned>(raw: &str) -> RedisManagerResult<T> {
    serde_json::from_str(raw).map_err(|e| RedisManagerError::Deserialization(e.to_string()))
}

/// 逐一解碼，任何一項失敗即返回錯誤
pub fn from_json_all<T: DeserializeOwned>(raws: Vec<String>) -> RedisManagerResult<Vec<T>> {
    raws.iter().map(|raw| from_json(raw)).collect()
}

/// 編碼為 bincode 位元組
pub fn to_binary<T: Serialize + ?Sized>(value: &T) -> RedisManagerResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| RedisManagerError::Serialization(e.to_string()))
}

/// 從 bincode 位元組解碼
pub fn from_binary<T: DeserializeOwned>(bytes: &[u8]) -> RedisManagerResult<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| RedisManagerError::Deserialization(e.to_string()))
}
