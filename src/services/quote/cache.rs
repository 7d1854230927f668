//! 行情缓存编排
//!
//! `get_quote` 的流程：
//! 1. 校验并规范化标的代码
//! 2. 读取缓存记录，新鲜则直接返回（不访问上游）
//! 3. 否则发起刷新：同一标的同时只有一个刷新在进行，其余调用方等待同一结果
//! 4. 刷新时先取实时报价，再取日线（日线失败不影响整体结果）
//! 5. 写回缓存（尽力而为，失败只记录日志）

use chrono::{Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::common::MAX_SYMBOL_LEN;
use super::error::QuoteError;
use super::freshness::is_fresh;
use super::normalize::build_view;
use super::provider::MarketDataClient;
use super::store::QuoteStore;
use crate::models::{QuoteRecord, QuoteView};

/// 刷新失败时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnRefreshFailure {
    /// 返回上游错误
    #[default]
    Fail,
    /// 若有过期记录则返回它（`stale = true`）
    ServeStale,
}

/// 缓存策略
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// 缓存有效期
    pub ttl: Duration,
    pub on_refresh_failure: OnRefreshFailure,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            on_refresh_failure: OnRefreshFailure::Fail,
        }
    }
}

type Flight = Shared<BoxFuture<'static, Result<QuoteView, QuoteError>>>;

struct Inner {
    client: Arc<dyn MarketDataClient>,
    store: Arc<dyn QuoteStore>,
    policy: CachePolicy,
    /// 正在进行的刷新，按标的代码索引
    in_flight: Mutex<HashMap<String, Flight>>,
}

/// 行情缓存服务
#[derive(Clone)]
pub struct QuoteService {
    inner: Arc<Inner>,
}

/// 校验标的代码并转为大写
pub fn normalize_symbol(symbol: &str) -> Result<String, QuoteError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(QuoteError::InvalidArgument(
            "Symbol parameter is required".to_string(),
        ));
    }

    let valid_chars = symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | ':'));
    if symbol.len() > MAX_SYMBOL_LEN || !valid_chars {
        return Err(QuoteError::InvalidArgument(format!(
            "Invalid symbol: {}",
            symbol
        )));
    }

    Ok(symbol)
}

impl QuoteService {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        store: Arc<dyn QuoteStore>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                store,
                policy,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// 获取标的行情
    pub async fn get_quote(&self, symbol: &str) -> Result<QuoteView, QuoteError> {
        let symbol = normalize_symbol(symbol)?;

        let record = self.inner.load_record(&symbol).await;
        if let Some(record) = record.filter(|r| self.inner.is_fresh(r)) {
            log::debug!("缓存命中: {}", symbol);
            return Ok(build_view(&record, false));
        }

        self.refresh_coalesced(symbol).await
    }

    /// 加入（或发起）该标的的刷新
    async fn refresh_coalesced(&self, symbol: String) -> Result<QuoteView, QuoteError> {
        let flight = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match in_flight.entry(symbol) {
                Entry::Occupied(entry) => {
                    log::debug!("等待进行中的刷新: {}", entry.key());
                    entry.get().clone()
                }
                Entry::Vacant(entry) => {
                    let inner = Arc::clone(&self.inner);
                    let key = entry.key().clone();
                    // 刷新在独立任务中运行，调用方全部取消也会完成并写回
                    let task = tokio::spawn(async move {
                        let result = inner.refresh(&key).await;
                        inner.finish_flight(&key);
                        result
                    });
                    let inner = Arc::clone(&self.inner);
                    let symbol = entry.key().clone();
                    let flight = async move {
                        task.await.unwrap_or_else(|e| {
                            log::error!("刷新任务异常 {}: {}", symbol, e);
                            inner.finish_flight(&symbol);
                            Err(QuoteError::Upstream(format!("refresh task failed: {}", e)))
                        })
                    }
                    .boxed()
                    .shared();
                    entry.insert(flight).clone()
                }
            }
        };

        flight.await
    }
}

impl Inner {
    fn is_fresh(&self, record: &QuoteRecord) -> bool {
        is_fresh(Some(record), Utc::now(), self.policy.ttl)
    }

    fn finish_flight(&self, symbol: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(symbol);
    }

    /// 读取缓存记录，读取失败按未命中处理
    async fn load_record(&self, symbol: &str) -> Option<QuoteRecord> {
        let store = Arc::clone(&self.store);
        let key = symbol.to_string();

        match tokio::task::spawn_blocking(move || store.get(&key)).await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                log::warn!("读取缓存失败 {}: {}", symbol, e);
                None
            }
            Err(e) => {
                log::error!("缓存读取任务异常 {}: {}", symbol, e);
                None
            }
        }
    }

    /// 写回缓存，失败不影响本次返回
    async fn save_record(&self, record: QuoteRecord) {
        let store = Arc::clone(&self.store);
        let symbol = record.symbol.clone();

        let result = tokio::task::spawn_blocking(move || {
            store.put(
                &record.symbol,
                &record.raw_quote,
                record.raw_series.as_ref(),
                record.refreshed_at,
            )
        })
        .await;

        match result {
            Ok(Ok(())) => log::debug!("缓存已更新: {}", symbol),
            Ok(Err(e)) => log::error!("写回缓存失败 {}: {}", symbol, e),
            Err(e) => log::error!("缓存写回任务异常 {}: {}", symbol, e),
        }
    }

    /// 从上游刷新单个标的
    async fn refresh(&self, symbol: &str) -> Result<QuoteView, QuoteError> {
        // 前一轮刷新可能刚刚完成
        let existing = self.load_record(symbol).await;
        if let Some(record) = existing.as_ref().filter(|r| self.is_fresh(r)) {
            return Ok(build_view(record, false));
        }

        log::info!("刷新行情: {}", symbol);
        let raw_quote = match self.client.fetch_quote(symbol).await {
            Ok(quote) => quote,
            Err(e) => return self.on_refresh_failure(symbol, existing, e.into()),
        };

        let raw_series = match self.client.fetch_daily_series(symbol).await {
            Ok(series) => Some(series),
            Err(e) => {
                log::warn!("获取 {} 日线失败，省略历史差值: {}", symbol, e);
                None
            }
        };

        let record = QuoteRecord {
            symbol: symbol.to_string(),
            raw_quote,
            raw_series,
            refreshed_at: Utc::now(),
        };
        let view = build_view(&record, false);
        self.save_record(record).await;

        Ok(view)
    }

    fn on_refresh_failure(
        &self,
        symbol: &str,
        existing: Option<QuoteRecord>,
        err: QuoteError,
    ) -> Result<QuoteView, QuoteError> {
        match (self.policy.on_refresh_failure, existing) {
            (OnRefreshFailure::ServeStale, Some(record)) => {
                log::warn!("刷新 {} 失败，返回过期数据: {}", symbol, err);
                Ok(build_view(&record, true))
            }
            _ => {
                log::warn!("刷新 {} 失败: {}", symbol, err);
                Err(err)
            }
        }
    }
}
