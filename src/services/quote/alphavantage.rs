//! Alpha Vantage 行情接口实现
//!
//! 对接 GLOBAL_QUOTE 与 TIME_SERIES_DAILY 两个接口

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde_json::Value;

use super::common::{
    non_empty_object, DAILY_SERIES_KEY, ERROR_MESSAGE_KEY, FUNCTION_GLOBAL_QUOTE,
    FUNCTION_TIME_SERIES_DAILY, GLOBAL_QUOTE_KEY, INFORMATION_KEY, NOTE_KEY,
};
use super::provider::{ClientError, MarketDataClient};
use crate::config::ProviderConfig;

/// Alpha Vantage 客户端
pub struct AlphaVantageClient {
    /// HTTP 客户端（带超时）
    client: Client,
    /// 接口地址
    base_url: String,
    /// API Key
    api_key: String,
}

impl AlphaVantageClient {
    /// 按配置创建客户端，每个请求都有明确的超时上限
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// 请求指定接口并返回响应体 JSON
    async fn query(&self, function: &str, symbol: &str) -> Result<Value, ClientError> {
        log::debug!("请求 {} 数据: symbol={}", function, symbol);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Unavailable(format!("{} 请求失败: {}", function, e)))?;

        if !response.status().is_success() {
            return Err(ClientError::Unavailable(format!(
                "{} 返回状态 {}",
                function,
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Unavailable(format!("{} 响应解析失败: {}", function, e)))
    }

    async fn get_quote(&self, symbol: &str) -> Result<Value, ClientError> {
        let body = self.query(FUNCTION_GLOBAL_QUOTE, symbol).await?;
        extract_global_quote(&body, symbol)
    }

    async fn get_daily_series(&self, symbol: &str) -> Result<Value, ClientError> {
        let body = self.query(FUNCTION_TIME_SERIES_DAILY, symbol).await?;
        extract_daily_series(&body, symbol)
    }
}

impl MarketDataClient for AlphaVantageClient {
    fn fetch_quote<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Result<Value, ClientError>> {
        self.get_quote(symbol).boxed()
    }

    fn fetch_daily_series<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        self.get_daily_series(symbol).boxed()
    }
}

/// 从 GLOBAL_QUOTE 响应中取出报价对象
fn extract_global_quote(body: &Value, symbol: &str) -> Result<Value, ClientError> {
    match non_empty_object(body.get(GLOBAL_QUOTE_KEY)) {
        Some(quote) => Ok(quote.clone()),
        None => {
            log_provider_notice(body, symbol);
            Err(ClientError::Empty(symbol.to_string()))
        }
    }
}

/// 从 TIME_SERIES_DAILY 响应中取出日线对象
fn extract_daily_series(body: &Value, symbol: &str) -> Result<Value, ClientError> {
    match non_empty_object(body.get(DAILY_SERIES_KEY)) {
        Some(series) => Ok(series.clone()),
        None => {
            log_provider_notice(body, symbol);
            Err(ClientError::Empty(symbol.to_string()))
        }
    }
}

/// 记录提供方以 200 状态返回的提示信息（限流、无效代码等）
fn log_provider_notice(body: &Value, symbol: &str) {
    for key in [NOTE_KEY, INFORMATION_KEY, ERROR_MESSAGE_KEY] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            log::warn!("行情接口提示 [{}] {}: {}", symbol, key, message);
        }
    }
}
