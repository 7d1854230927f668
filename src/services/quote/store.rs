//! 行情缓存持久化
//!
//! SQLite 存储，通过 r2d2 连接池按操作借出连接，不持有全局连接

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::models::QuoteRecord;

/// 持久化错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("获取数据库连接失败: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("数据库操作失败: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("原始数据编解码失败: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("无效的刷新时间戳: {0}")]
    Timestamp(i64),
}

/// 行情记录存储
///
/// `put` 为整体覆盖的 upsert，不做字段级合并
pub trait QuoteStore: Send + Sync {
    fn get(&self, symbol: &str) -> Result<Option<QuoteRecord>, StoreError>;

    fn put(
        &self,
        symbol: &str,
        raw_quote: &Value,
        raw_series: Option<&Value>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS quote_records (
        symbol TEXT PRIMARY KEY,
        raw_quote TEXT NOT NULL,
        raw_series TEXT,
        refreshed_at_ms INTEGER NOT NULL
    );
"#;

// 旧时间戳的写入被忽略，保证 refreshed_at 单调不减
const UPSERT: &str = r#"
    INSERT INTO quote_records (symbol, raw_quote, raw_series, refreshed_at_ms)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(symbol) DO UPDATE SET
        raw_quote = excluded.raw_quote,
        raw_series = excluded.raw_series,
        refreshed_at_ms = excluded.refreshed_at_ms
    WHERE excluded.refreshed_at_ms >= quote_records.refreshed_at_ms
"#;

const SELECT: &str =
    "SELECT raw_quote, raw_series, refreshed_at_ms FROM quote_records WHERE symbol = ?1";

/// SQLite 行情存储
#[derive(Clone)]
pub struct SqliteQuoteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteQuoteStore {
    /// 打开（或创建）数据库文件并初始化表结构
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA busy_timeout=5000; PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;",
            )
        });
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        pool.get()?.execute_batch(SCHEMA)?;
        log::info!(
            "行情缓存数据库已就绪: {} (连接池 {})",
            path.as_ref().display(),
            pool.max_size()
        );

        Ok(Self { pool })
    }
}

impl QuoteStore for SqliteQuoteStore {
    fn get(&self, symbol: &str) -> Result<Option<QuoteRecord>, StoreError> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(SELECT, params![symbol], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .optional()?;

        let Some((raw_quote, raw_series, refreshed_at_ms)) = row else {
            return Ok(None);
        };

        let refreshed_at = DateTime::<Utc>::from_timestamp_millis(refreshed_at_ms)
            .ok_or(StoreError::Timestamp(refreshed_at_ms))?;
        let raw_series = raw_series
            .map(|s| serde_json::from_str::<Value>(&s))
            .transpose()?;

        Ok(Some(QuoteRecord {
            symbol: symbol.to_string(),
            raw_quote: serde_json::from_str(&raw_quote)?,
            raw_series,
            refreshed_at,
        }))
    }

    fn put(
        &self,
        symbol: &str,
        raw_quote: &Value,
        raw_series: Option<&Value>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let raw_quote = serde_json::to_string(raw_quote)?;
        let raw_series = raw_series.map(serde_json::to_string).transpose()?;

        let conn = self.pool.get()?;
        let changed = conn.execute(
            UPSERT,
            params![symbol, raw_quote, raw_series, now.timestamp_millis()],
        )?;
        if changed == 0 {
            log::debug!("忽略 {} 的过期写入 ({})", symbol, now);
        }
        Ok(())
    }
}
