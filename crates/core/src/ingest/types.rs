use crate::domain::analytics::{AnalyticsRecord, Symbol};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const CURRENT_PRICE: &str = "currentPrice";
const TARGET_HIGH_PRICE: &str = "targetHighPrice";
const TARGET_LOW_PRICE: &str = "targetLowPrice";
const TARGET_MEAN_PRICE: &str = "targetMeanPrice";
const RECOMMENDATION_KEY: &str = "recommendationKey";
const ANALYST_OPINIONS: &str = "numberOfAnalystOpinions";

/// Object-shaped analytics response.
///
/// Numeric fields arrive wrapped as `{ "raw": value, "fmt": "..." }`. Every accessor
/// returns `None` when a level is missing or has the wrong type.
#[derive(Debug, Clone)]
pub struct AnalyticsPayload(Map<String, Value>);

impl AnalyticsPayload {
    pub fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Object(o) => Ok(Self(o)),
            other => Err(other),
        }
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)?.as_object()?.get("raw")
    }

    pub fn raw_f64(&self, key: &str) -> Option<f64> {
        self.raw(key)?.as_f64()
    }

    pub fn raw_i64(&self, key: &str) -> Option<i64> {
        let v = self.raw(key)?;
        v.as_i64().or_else(|| {
            v.as_f64()
                .filter(|f| {
                    f.is_finite()
                        && f.fract() == 0.0
                        && *f >= i64::MIN as f64
                        && *f < i64::MAX as f64
                })
                .map(|f| f as i64)
        })
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }

    pub fn into_record(self, symbol: &Symbol, fetched_at: DateTime<Utc>) -> AnalyticsRecord {
        AnalyticsRecord {
            symbol: symbol.as_str().to_string(),
            price: self.raw_f64(CURRENT_PRICE),
            target_high: self.raw_f64(TARGET_HIGH_PRICE),
            target_low: self.raw_f64(TARGET_LOW_PRICE),
            target_mean: self.raw_f64(TARGET_MEAN_PRICE),
            recommendation: self.string(RECOMMENDATION_KEY).map(str::to_string),
            analyst_count: self.raw_i64(ANALYST_OPINIONS),
            fetched_at,
        }
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
