//! 公共常量和辅助函数

use serde_json::Value;

// ==================== Alpha Vantage 接口常量 ====================

/// 实时报价接口函数名
pub const FUNCTION_GLOBAL_QUOTE: &str = "GLOBAL_QUOTE";
/// 日线接口函数名
pub const FUNCTION_TIME_SERIES_DAILY: &str = "TIME_SERIES_DAILY";

/// 实时报价响应中的报价对象
pub const GLOBAL_QUOTE_KEY: &str = "Global Quote";
/// 日线响应中的序列对象
pub const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

/// 限流提示（以 200 状态返回）
pub const NOTE_KEY: &str = "Note";
/// 额度/付费提示
pub const INFORMATION_KEY: &str = "Information";
/// 参数错误提示
pub const ERROR_MESSAGE_KEY: &str = "Error Message";

// ==================== 报价字段 ====================

pub const FIELD_OPEN: &str = "02. open";
pub const FIELD_HIGH: &str = "03. high";
pub const FIELD_LOW: &str = "04. low";
pub const FIELD_PRICE: &str = "05. price";
pub const FIELD_VOLUME: &str = "06. volume";
pub const FIELD_PREVIOUS_CLOSE: &str = "08. previous close";
pub const FIELD_CHANGE: &str = "09. change";
pub const FIELD_CHANGE_PERCENT: &str = "10. change percent";

/// 日线条目中的收盘价
pub const FIELD_CLOSE: &str = "4. close";

/// 标的代码最大长度
pub const MAX_SYMBOL_LEN: usize = 32;

/// 解析数值字段，兼容字符串和数字两种表示
pub fn parse_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// 解析成交量，小数部分截断
pub fn parse_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v.trunc() as u64)
            })
        }
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// 取出非空 JSON 对象
pub fn non_empty_object(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
}
