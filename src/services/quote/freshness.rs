//! 缓存新鲜度判断

use chrono::{DateTime, Duration, Utc};

use crate::models::QuoteRecord;

/// 记录存在且距上次刷新不足 `ttl` 时为新鲜；不存在的记录永远不新鲜
pub fn is_fresh(record: Option<&QuoteRecord>, now: DateTime<Utc>, ttl: Duration) -> bool {
    record.is_some_and(|r| now - r.refreshed_at < ttl)
}
