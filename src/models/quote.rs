//! 行情缓存数据模型
//!
//! `QuoteRecord` 是持久化的唯一数据源，`QuoteView` 每次读取时由记录重新计算

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单个标的的缓存记录
///
/// `raw_quote` 与 `raw_series` 保存行情提供方返回的原始 JSON 对象，不做字段级校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// 标的代码（大写）
    pub symbol: String,
    /// 实时报价原始数据（`Global Quote` 对象）
    pub raw_quote: Value,
    /// 日线序列原始数据（`Time Series (Daily)` 对象），日线请求失败时为空
    pub raw_series: Option<Value>,
    /// 最近一次成功刷新的时间
    pub refreshed_at: DateTime<Utc>,
}

/// 对外返回的行情视图，不持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    /// 标的代码
    pub symbol: String,
    /// 最新价
    pub price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅，保留提供方的字符串格式（如 "1.23%"）
    pub change_percent: String,
    /// 成交量
    pub volume: u64,
    /// 昨收
    pub previous_close: f64,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 较上一交易日收盘的变化，日线不足 2 条时为空
    pub yesterday_change: Option<f64>,
    /// 较 7 个交易日前收盘的变化，日线不足 8 条时为空
    pub week_change: Option<f64>,
    /// 底层记录的刷新时间
    pub refreshed_at: DateTime<Utc>,
    /// 是否为过期数据（仅在 serve_stale 策略下刷新失败时出现）
    pub stale: bool,
    /// 是否有字段解析失败并以 0 代替
    pub partial: bool,
    /// 解析失败的字段名
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unparsed_fields: Vec<String>,
}
