//! Redis操作模組
//!
//! 依資料結構分成數個特質，全部由 `RedisManager` 實現。
//! 每次呼叫取得一條連接、執行命令、返回時歸還連接。

pub mod binary;
pub mod hash;
pub mod item;
pub mod keys;
pub mod list;
pub mod set;
pub mod sorted_set;

pub use binary::BinaryOperations;
pub use hash::HashOperations;
pub use item::ItemOperations;
pub use keys::KeyOperations;
pub use list::ListOperations;
pub use set::SetOperations;
pub use sorted_set::SortedSetOperations;

use super::error::{RedisManagerError, RedisManagerResult};
use chrono::{DateTime, Utc};
use deadpool_redis::redis::RedisResult;
use std::time::Duration;
use tracing::error;

/// 為命令結果加上失敗日誌並轉換錯誤類型
pub(crate) trait RedisResultExt<T> {
    fn logged(self, command: &str, key: &str) -> RedisManagerResult<T>;
}

impl<T> RedisResultExt<T> for RedisResult<T> {
    fn logged(self, command: &str, key: &str) -> RedisManagerResult<T> {
        self.map_err(|e| {
            error!("Redis命令 {} 失敗 [{}]: {}", command, key, e);
            RedisManagerError::Redis(e)
        })
    }
}

/// 有效期轉為毫秒，不足一毫秒視為無效
pub(crate) fn ttl_millis(ttl: Duration) -> RedisManagerResult<u64> {
    match u64::try_from(ttl.as_millis()) {
        Ok(0) => Err(RedisManagerError::InvalidArgument(
            "有效期必須至少為一毫秒".to_string(),
        )),
        Ok(millis) => Ok(millis),
        Err(_) => Err(RedisManagerError::InvalidArgument(format!(
            "有效期過長: {:?}",
            ttl
        ))),
    }
}

/// 距離指定時間點的毫秒數，已過期時為 None
pub(crate) fn millis_until(at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let remaining = (at - now).num_milliseconds();
    (remaining > 0).then_some(remaining as u64)
}

/// 從 `index` 起取 `count` 筆的閉區間
///
/// `count` 為 0 或起點超出 `isize` 時為 None；終點超出時以 -1 讀到末尾。
pub(crate) fn range_bounds(index: usize, count: usize) -> Option<(isize, isize)> {
    if count == 0 {
        return None;
    }
    let start = isize::try_from(index).ok()?;
    let stop = index
        .checked_add(count - 1)
        .and_then(|stop| isize::try_from(stop).ok())
        .unwrap_or(-1);
    Some((start, stop))
}

/// 第 `page_index` 頁（從 1 開始）的閉區間，0 視為第 1 頁
pub(crate) fn page_bounds(page_index: usize, page_size: usize) -> Option<(isize, isize)> {
    let page_index = page_index.max(1);
    let start = page_size.checked_mul(page_index - 1)?;
    range_bounds(start, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn test_ttl_millis() {
        assert_eq!(ttl_millis(Duration::from_secs(60)).ok(), Some(60_000));
        assert_eq!(ttl_millis(Duration::from_millis(1)).ok(), Some(1));
        assert_matches!(
            ttl_millis(Duration::from_micros(999)),
            Err(RedisManagerError::InvalidArgument(_))
        );
        assert_matches!(
            ttl_millis(Duration::ZERO),
            Err(RedisManagerError::InvalidArgument(_))
        );
    }

    #[test]
    fn test_millis_until() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap();

        assert_eq!(millis_until(later, now), Some(60_000));
        assert_eq!(millis_until(now, now), None);
        assert_eq!(millis_until(now, later), None);
    }

    #[rstest]
    #[case(0, 10, Some((0, 9)))]
    #[case(5, 1, Some((5, 5)))]
    #[case(3, 0, None)]
    #[case(0, usize::MAX, Some((0, -1)))]
    #[case(10, isize::MAX as usize, Some((10, -1)))]
    #[case(isize::MAX as usize, 1, Some((isize::MAX, isize::MAX)))]
    #[case(isize::MAX as usize + 1, 1, None)]
    #[case(usize::MAX, 5, None)]
    fn test_range_bounds(
        #[case] index: usize,
        #[case] count: usize,
        #[case] expected: Option<(isize, isize)>,
    ) {
        assert_eq!(range_bounds(index, count), expected);
    }

    #[rstest]
    #[case(1, 10, Some((0, 9)))]
    #[case(3, 10, Some((20, 29)))]
    #[case(0, 10, Some((0, 9)))]
    #[case(2, 0, None)]
    #[case(1, usize::MAX, Some((0, -1)))]
    #[case(4, usize::MAX / 2, None)]
    #[case(usize::MAX, 2, None)]
    #[case(2, isize::MAX as usize, Some((isize::MAX, -1)))]
    fn test_page_bounds(
        #[case] page_index: usize,
        #[case] page_size: usize,
        #[case] expected: Option<(isize, isize)>,
    ) {
        assert_eq!(page_bounds(page_index, page_size), expected);
    }
}
