//! 测试辅助：模拟行情数据源与存储

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::provider::{ClientError, MarketDataClient};
use super::store::{QuoteStore, SqliteQuoteStore, StoreError};
use crate::models::QuoteRecord;

/// IBM 的 GLOBAL_QUOTE 报价对象
pub fn ibm_quote() -> Value {
    json!({
        "01. symbol": "IBM",
        "02. open": "133.0000",
        "03. high": "135.2000",
        "04. low": "132.5000",
        "05. price": "134.5600",
        "06. volume": "3489012",
        "07. latest trading day": "2024-03-28",
        "08. previous close": "132.9600",
        "09. change": "1.6000",
        "10. change percent": "1.2034%"
    })
}

/// 连续交易日的日线对象，下标 0 为最近一天
pub fn series_of(closes: &[f64]) -> Value {
    let latest = NaiveDate::from_ymd_opt(2024, 3, 28).unwrap_or_default();
    let mut map = Map::new();
    for (i, close) in closes.iter().enumerate() {
        let date = latest - chrono::Duration::days(i as i64);
        map.insert(
            date.format("%Y-%m-%d").to_string(),
            json!({ "4. close": format!("{:.4}", close) }),
        );
    }
    Value::Object(map)
}

/// 临时目录中的 SQLite 存储，目录随返回值一起释放
pub fn temp_store() -> (tempfile::TempDir, Arc<SqliteQuoteStore>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = SqliteQuoteStore::open(dir.path().join("quotes.db"), 4).expect("open store");
    (dir, Arc::new(store))
}

/// 模拟行情数据源，统计调用次数
pub struct FakeClient {
    quote: Mutex<Result<Value, ClientError>>,
    series: Mutex<Result<Value, ClientError>>,
    delay: Option<Duration>,
    quote_calls: AtomicUsize,
    series_calls: AtomicUsize,
}

impl FakeClient {
    pub fn new(quote: Result<Value, ClientError>, series: Result<Value, ClientError>) -> Self {
        Self {
            quote: Mutex::new(quote),
            series: Mutex::new(series),
            delay: None,
            quote_calls: AtomicUsize::new(0),
            series_calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(quote: Value, series: Value) -> Self {
        Self::new(Ok(quote), Ok(series))
    }

    pub fn failing(err: ClientError) -> Self {
        Self::new(Err(err.clone()), Err(err))
    }

    /// 每次调用前等待，用于制造并发重叠
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    async fn respond(
        &self,
        counter: &AtomicUsize,
        response: &Mutex<Result<Value, ClientError>>,
    ) -> Result<Value, ClientError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = response.lock().expect("fake client lock").clone();
        result
    }
}

impl MarketDataClient for FakeClient {
    fn fetch_quote<'a>(&'a self, _symbol: &'a str) -> BoxFuture<'a, Result<Value, ClientError>> {
        self.respond(&self.quote_calls, &self.quote).boxed()
    }

    fn fetch_daily_series<'a>(
        &'a self,
        _symbol: &'a str,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        self.respond(&self.series_calls, &self.series).boxed()
    }
}

/// 读写都失败的存储
pub struct FailingStore;

impl QuoteStore for FailingStore {
    fn get(&self, _symbol: &str) -> Result<Option<QuoteRecord>, StoreError> {
        Err(StoreError::Timestamp(-1))
    }

    fn put(
        &self,
        _symbol: &str,
        _raw_quote: &Value,
        _raw_series: Option<&Value>,
        _now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Timestamp(-1))
    }
}
