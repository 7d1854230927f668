//! 报价数据标准化
//!
//! 由缓存记录构建 `QuoteView`；单个字段解析失败时取 0 并记入 `unparsed_fields`

use serde_json::Value;

use super::common::{
    parse_f64, parse_u64, FIELD_CHANGE, FIELD_CHANGE_PERCENT, FIELD_HIGH, FIELD_LOW, FIELD_OPEN,
    FIELD_PREVIOUS_CLOSE, FIELD_PRICE, FIELD_VOLUME,
};
use super::diff::compute_diffs;
use crate::models::{QuoteRecord, QuoteView};

/// 逐字段解析，记录失败字段
struct FieldReader<'a> {
    quote: &'a Value,
    unparsed: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(quote: &'a Value) -> Self {
        Self {
            quote,
            unparsed: Vec::new(),
        }
    }

    fn number(&mut self, field: &str) -> f64 {
        parse_f64(self.quote.get(field)).unwrap_or_else(|| {
            self.unparsed.push(field.to_string());
            0.0
        })
    }

    fn count(&mut self, field: &str) -> u64 {
        parse_u64(self.quote.get(field)).unwrap_or_else(|| {
            self.unparsed.push(field.to_string());
            0
        })
    }

    fn percent(&mut self, field: &str) -> String {
        match self.quote.get(field).and_then(Value::as_str).map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                self.unparsed.push(field.to_string());
                "0%".to_string()
            }
        }
    }
}

/// 由缓存记录构建行情视图，日线差值每次重新计算
pub fn build_view(record: &QuoteRecord, stale: bool) -> QuoteView {
    let mut fields = FieldReader::new(&record.raw_quote);

    let price = fields.number(FIELD_PRICE);
    let change = fields.number(FIELD_CHANGE);
    let change_percent = fields.percent(FIELD_CHANGE_PERCENT);
    let volume = fields.count(FIELD_VOLUME);
    let previous_close = fields.number(FIELD_PREVIOUS_CLOSE);
    let open = fields.number(FIELD_OPEN);
    let high = fields.number(FIELD_HIGH);
    let low = fields.number(FIELD_LOW);

    let diffs = record
        .raw_series
        .as_ref()
        .map(compute_diffs)
        .unwrap_or_default();

    let unparsed_fields = fields.unparsed;
    QuoteView {
        symbol: record.symbol.clone(),
        price,
        change,
        change_percent,
        volume,
        previous_close,
        open,
        high,
        low,
        yesterday_change: diffs.yesterday_change,
        week_change: diffs.week_change,
        refreshed_at: record.refreshed_at,
        stale,
        partial: diffs.degraded || !unparsed_fields.is_empty(),
        unparsed_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn ibm_quote() -> Value {
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

    #[test]
    fn test_build_view_full_quote() {
        let record = QuoteRecord {
            symbol: "IBM".to_string(),
            raw_quote: ibm_quote(),
            raw_series: Some(json!({
                "2024-03-28": { "4. close": "134.56" },
                "2024-03-27": { "4. close": "132.56" },
            })),
            refreshed_at: Utc::now(),
        };

        let view = build_view(&record, false);
        assert_eq!(view.symbol, "IBM");
        assert_eq!(view.price, 134.56);
        assert_eq!(view.change, 1.6);
        assert_eq!(view.change_percent, "1.2034%");
        assert_eq!(view.volume, 3_489_012);
        assert_eq!(view.previous_close, 132.96);
        assert_eq!(view.open, 133.0);
        assert_eq!(view.high, 135.2);
        assert_eq!(view.low, 132.5);
        assert!(view.yesterday_change.is_some());
        assert_eq!(view.week_change, None);
        assert!(!view.stale);
        assert!(!view.partial);
        assert!(view.unparsed_fields.is_empty());
    }

    #[test]
    fn test_unparsable_fields_become_zero_and_flagged() {
        let mut quote = ibm_quote();
        quote["05. price"] = json!("--");
        quote.as_object_mut().unwrap().remove("10. change percent");

        let record = QuoteRecord {
            symbol: "IBM".to_string(),
            raw_quote: quote,
            raw_series: None,
            refreshed_at: Utc::now(),
        };

        let view = build_view(&record, true);
        assert_eq!(view.price, 0.0);
        assert_eq!(view.change_percent, "0%");
        assert_eq!(view.open, 133.0);
        assert!(view.partial);
        assert!(view.stale);
        assert_eq!(
            view.unparsed_fields,
            vec!["05. price".to_string(), "10. change percent".to_string()]
        );
        assert_eq!(view.yesterday_change, None);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let record = QuoteRecord {
            symbol: "IBM".to_string(),
            raw_quote: ibm_quote(),
            raw_series: None,
            refreshed_at: Utc::now(),
        };
        let value = serde_json::to_value(build_view(&record, false)).unwrap();
        assert_eq!(value["previousClose"], json!(132.96));
        assert_eq!(value["changePercent"], json!("1.2034%"));
        assert_eq!(value["yesterdayChange"], Value::Null);
        assert!(value.get("unparsedFields").is_none());
    }
}
