//! 行情数据源抽象

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

/// 行情数据源错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// 网络失败、超时、非 2xx 状态或响应体无法解析
    #[error("行情接口不可用: {0}")]
    Unavailable(String),
    /// 响应成功但没有可用数据（代码无效或限流提示）
    #[error("行情接口未返回 {0} 的数据")]
    Empty(String),
}

/// 行情数据源
///
/// 每个方法只发起一次上游请求，返回提供方原始格式的 JSON 对象
pub trait MarketDataClient: Send + Sync {
    /// 获取实时报价对象
    fn fetch_quote<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Result<Value, ClientError>>;

    /// 获取按日期索引的日线序列对象
    fn fetch_daily_series<'a>(
        &'a self,
        symbol: &'a str,
    ) -> BoxFuture<'a, Result<Value, ClientError>>;
}
