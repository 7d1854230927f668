//! 日线差值计算
//!
//! 按日期倒序排列日线后，计算较上一交易日与较 7 个交易日前的收盘价变化

use chrono::NaiveDate;
use serde_json::Value;

use super::common::{parse_f64, FIELD_CLOSE};

/// 较上一交易日的偏移
const YESTERDAY_OFFSET: usize = 1;
/// 较一周前的偏移（按交易日计，不是自然周）
const WEEK_OFFSET: usize = 7;

/// 差值计算结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesDiffs {
    /// 最近收盘价 - 上一交易日收盘价
    pub yesterday_change: Option<f64>,
    /// 最近收盘价 - 7 个交易日前收盘价
    pub week_change: Option<f64>,
    /// 参与计算的收盘价中是否有解析失败（按 0 计）
    pub degraded: bool,
}

/// 单日收盘价
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
    /// 收盘价解析失败，`close` 为 0
    pub unparsed: bool,
}

/// 解析日期键，兼容带时间的键（如 "2024-01-05 16:00:00"）
fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let date_part = key.get(..10).unwrap_or(key);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// 从日线 JSON 对象中提取收盘价，无法识别为日期的键会被忽略
pub fn extract_closes(series: &Value) -> Vec<DailyClose> {
    let Some(entries) = series.as_object() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|(key, entry)| {
            let date = parse_date_key(key)?;
            let close = parse_f64(entry.get(FIELD_CLOSE));
            Some(DailyClose {
                date,
                close: close.unwrap_or(0.0),
                unparsed: close.is_none(),
            })
        })
        .collect()
}

/// 计算日线差值，输入顺序不影响结果
pub fn diffs_from_closes(mut closes: Vec<DailyClose>) -> SeriesDiffs {
    closes.sort_by(|a, b| b.date.cmp(&a.date));

    let Some(latest) = closes.first() else {
        return SeriesDiffs::default();
    };

    let mut degraded = false;
    let mut change_from = |offset: usize| {
        closes.get(offset).map(|past| {
            degraded |= latest.unparsed || past.unparsed;
            latest.close - past.close
        })
    };

    let yesterday_change = change_from(YESTERDAY_OFFSET);
    let week_change = change_from(WEEK_OFFSET);

    SeriesDiffs {
        yesterday_change,
        week_change,
        degraded,
    }
}

/// 计算日线 JSON 对象的差值
pub fn compute_diffs(series: &Value) -> SeriesDiffs {
    diffs_from_closes(extract_closes(series))
}
